//! Scripted transport for tests
//!
//! [`FakeTransport`] replays a script of [`Reply`] values, one per attempt,
//! repeating the last entry once the script runs out. It records every
//! request it receives (reading the body to the end, as a real server
//! would) and counts how many of the response bodies it handed out have
//! since been dropped.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};

use crate::body::Body;
use crate::request::Request;
use crate::response::Response;
use crate::transport::{Outcome, RoundTrip, TransportError};

/// One scripted attempt result
#[derive(Debug, Clone)]
pub enum Reply {
    /// A response with the given status and body
    Response { status: u16, body: Bytes },
    /// A connection failure
    ConnectError(String),
    /// A response whose body fails after the first chunk
    BrokenBody { status: u16 },
}

impl Reply {
    /// A response with an empty body
    pub fn status(status: u16) -> Self {
        Self::Response {
            status,
            body: Bytes::new(),
        }
    }

    /// A response with a body
    pub fn body(status: u16, body: impl Into<Bytes>) -> Self {
        Self::Response {
            status,
            body: body.into(),
        }
    }

    /// A connection refused error
    pub fn connect_error() -> Self {
        Self::ConnectError("connection refused".to_string())
    }

    /// A response whose body cannot be read to the end
    pub fn broken_body(status: u16) -> Self {
        Self::BrokenBody { status }
    }
}

/// A request as received by [`FakeTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// The full body, or `None` if the request had none
    pub body: Option<Bytes>,
}

/// Test double implementing [`RoundTrip`] from a script
#[derive(Debug)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    attempts: AtomicU32,
    issued: AtomicU32,
    released: Arc<AtomicU32>,
}

impl FakeTransport {
    /// Answer attempts with `replies` in order, repeating the last one
    pub fn sequence(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            attempts: AtomicU32::new(0),
            issued: AtomicU32::new(0),
            released: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Answer every attempt with the same reply
    pub fn always(reply: Reply) -> Self {
        Self::sequence([reply])
    }

    /// Number of attempts received
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Panic unless exactly `expected` attempts were received
    pub fn assert_num_requests(&self, expected: u32) {
        assert_eq!(
            self.attempts(),
            expected,
            "expected {} requests, got {}",
            expected,
            self.attempts()
        );
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Bodies of the requests received so far
    pub fn request_bodies(&self) -> Vec<Option<Bytes>> {
        lock(&self.requests).iter().map(|r| r.body.clone()).collect()
    }

    /// Response bodies handed out
    pub fn issued_bodies(&self) -> u32 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Response bodies handed out and since dropped
    pub fn released_bodies(&self) -> u32 {
        self.released.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut last = lock(&self.last);
        if let Some(reply) = lock(&self.script).pop_front() {
            *last = Some(reply);
        }
        last.clone().unwrap_or_else(|| Reply::status(200))
    }

    fn tracked_body(&self, chunks: Vec<Result<Bytes, io::Error>>) -> Body {
        self.issued.fetch_add(1, Ordering::SeqCst);
        let guard = ReleaseGuard(self.released.clone());
        Body::wrap_stream(stream::iter(chunks).map(move |chunk| {
            let _guard = &guard;
            chunk
        }))
    }
}

#[async_trait]
impl RoundTrip for FakeTransport {
    async fn round_trip(&self, mut request: Request) -> Outcome {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let body = match request.take_body() {
            Some(body) => Some(body.collect().await.map_err(TransportError::Other)?),
            None => None,
        };
        lock(&self.requests).push(RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body,
        });

        match self.next_reply() {
            Reply::Response { status, body } => {
                let body = self.tracked_body(vec![Ok(body)]);
                Ok(Response::new(status_code(status)?, body).with_url(request.url().clone()))
            }
            Reply::ConnectError(message) => Err(TransportError::Connect(message)),
            Reply::BrokenBody { status } => {
                let body = self.tracked_body(vec![
                    Ok(Bytes::from_static(b"partial")),
                    Err(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset by peer",
                    )),
                ]);
                Ok(Response::new(status_code(status)?, body))
            }
        }
    }
}

struct ReleaseGuard(Arc<AtomicU32>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn status_code(status: u16) -> Result<StatusCode, TransportError> {
    StatusCode::from_u16(status).map_err(|e| TransportError::invalid_request(e.to_string()))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
