//! Outbound requests and body replay
//!
//! A [`Request`] owns its body, so sending it consumes the body. Before the
//! first attempt the executor takes a [`Replay`] snapshot: the method, URL,
//! headers, cancellation token and body factory. Every retried attempt is
//! built from that snapshot with a freshly materialised body.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use tokio_util::sync::CancellationToken;

use crate::body::{Body, BodyFactory};
use crate::error::{BoxError, Error, Result};

/// An outbound HTTP request
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Body>,
    body_factory: Option<BodyFactory>,
    cancellation: CancellationToken,
}

impl Request {
    /// Create a request without a body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            body_factory: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a GET request, parsing the URL
    pub fn get(url: &str) -> Result<Self> {
        Ok(Self::new(Method::GET, Url::parse(url)?))
    }

    /// Create a POST request, parsing the URL
    pub fn post(url: &str) -> Result<Self> {
        Ok(Self::new(Method::POST, Url::parse(url)?))
    }

    /// Create a PUT request, parsing the URL
    pub fn put(url: &str) -> Result<Self> {
        Ok(Self::new(Method::PUT, Url::parse(url)?))
    }

    /// Add a header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set an in-memory body
    ///
    /// In-memory bodies are replayable: a body factory that re-clones the
    /// bytes is installed alongside the body. Stream bodies passed here get
    /// no factory; use [`with_body_factory`](Self::with_body_factory) for
    /// those.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        let body = body.into();
        self.body_factory = body.to_bytes().map(|bytes| {
            let factory: BodyFactory =
                Arc::new(move || Ok::<_, BoxError>(Body::from(bytes.clone())));
            factory
        });
        self.body = Some(body);
        self
    }

    /// Set a one-shot body with no way to regenerate it
    ///
    /// Such a request can be sent once. If a retry is needed the executor
    /// fails with [`Error::BodyNotReplayable`] instead of resending a
    /// consumed body.
    pub fn with_stream_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self.body_factory = None;
        self
    }

    /// Set a body factory and materialise the first body from it
    pub fn with_body_factory<F>(mut self, factory: F) -> Result<Self>
    where
        F: Fn() -> std::result::Result<Body, BoxError> + Send + Sync + 'static,
    {
        let factory: BodyFactory = Arc::new(factory);
        self.body = Some(factory().map_err(Error::replay)?);
        self.body_factory = Some(factory);
        Ok(self)
    }

    /// Link the request to a caller-owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Get the method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get mutable headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the body, if any
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Take the body out of the request
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Check whether a body factory is installed
    pub fn has_body_factory(&self) -> bool {
        self.body_factory.is_some()
    }

    /// Get the cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Produce a structurally equivalent copy with a fresh, unread body
    ///
    /// - no body: the copy has no body
    /// - body and factory: the copy's body comes from the factory
    /// - body without factory: [`Error::BodyNotReplayable`]
    pub fn replay(&self) -> Result<Request> {
        Replay::from(self).next_request()
    }

    pub(crate) fn into_reqwest(self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        *request.body_mut() = self.body.map(Body::into_reqwest);
        request
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("replayable", &self.body_factory.is_some())
            .finish()
    }
}

/// Replay inputs captured from a request before its body is consumed
pub struct Replay {
    method: Method,
    url: Url,
    headers: HeaderMap,
    cancellation: CancellationToken,
    body: ReplayBody,
}

enum ReplayBody {
    None,
    Factory(BodyFactory),
    Unavailable,
}

impl Replay {
    /// Build the request for the next attempt
    pub fn next_request(&self) -> Result<Request> {
        let (body, body_factory) = match &self.body {
            ReplayBody::None => (None, None),
            ReplayBody::Factory(factory) => (
                Some(factory().map_err(Error::replay)?),
                Some(Arc::clone(factory)),
            ),
            ReplayBody::Unavailable => return Err(Error::BodyNotReplayable),
        };

        Ok(Request {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body,
            body_factory,
            cancellation: self.cancellation.clone(),
        })
    }

    /// Check whether a retried attempt can be built
    pub fn is_replayable(&self) -> bool {
        !matches!(self.body, ReplayBody::Unavailable)
    }
}

impl From<&Request> for Replay {
    fn from(request: &Request) -> Self {
        let body = match (&request.body, &request.body_factory) {
            (None, _) => ReplayBody::None,
            (Some(_), Some(factory)) => ReplayBody::Factory(Arc::clone(factory)),
            (Some(_), None) => ReplayBody::Unavailable,
        };

        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            cancellation: request.cancellation.clone(),
            body,
        }
    }
}
