//! The underlying transport capability
//!
//! A [`RoundTrip`] executes exactly one attempt of a request and reports an
//! [`Outcome`]: a response, or a transport-level error. It has no retry
//! semantics of its own; [`RetryTransport`](crate::RetryTransport) layers
//! those on top of any implementation.

mod client;

pub use client::ReqwestTransport;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

/// The result of a single attempt
pub type Outcome = std::result::Result<Response, TransportError>;

/// Transport-level failures: no usable response was produced
#[derive(Error, Debug)]
pub enum TransportError {
    /// Error reported by the HTTP client
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request's cancellation token fired during the attempt
    #[error("request cancelled")]
    Cancelled,

    /// The request could not be sent as built
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other transport failure
    #[error(transparent)]
    Other(BoxError),
}

impl TransportError {
    /// Create a connection error
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect(message.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Wrap an arbitrary error
    pub fn other(source: impl Into<BoxError>) -> Self {
        Self::Other(source.into())
    }

    /// Check if the connection could not be established
    pub fn is_connect(&self) -> bool {
        match self {
            TransportError::Connect(_) => true,
            TransportError::Http(err) => err.is_connect(),
            _ => false,
        }
    }

    /// Check if the attempt timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Http(err) if err.is_timeout())
    }

    /// Check if the attempt was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

/// Execute one attempt of a request
#[async_trait]
pub trait RoundTrip: Send + Sync {
    /// Send the request and wait for the response head
    async fn round_trip(&self, request: Request) -> Outcome;
}

#[async_trait]
impl<T: RoundTrip + ?Sized> RoundTrip for Arc<T> {
    async fn round_trip(&self, request: Request) -> Outcome {
        (**self).round_trip(request).await
    }
}

#[async_trait]
impl<T: RoundTrip + ?Sized> RoundTrip for Box<T> {
    async fn round_trip(&self, request: Request) -> Outcome {
        (**self).round_trip(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_connect_classification() {
        let err = TransportError::connect("connection refused");
        assert!(err.is_connect());
        assert!(!err.is_timeout());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_other_is_transparent() {
        let err = TransportError::other(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        assert_eq!(err.to_string(), "broken pipe");
        assert!(!err.is_connect());
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(TransportError::Cancelled.to_string(), "request cancelled");
        assert!(TransportError::Cancelled.is_cancelled());
    }
}
