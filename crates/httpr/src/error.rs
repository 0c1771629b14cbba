//! Error types for httpr

use thiserror::Error;

use crate::transport::TransportError;

/// Boxed error used for body streams and body factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias using httpr's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`RetryTransport::perform`](crate::RetryTransport::perform)
/// and the supporting request, response, and configuration APIs
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying transport failed on the final attempt
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request's cancellation token fired while waiting to retry
    #[error("request cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    /// A discarded response could not be drained before retrying
    #[error("failed to drain response body before retry: {0}")]
    Drain(#[source] BoxError),

    /// The request has a body but no factory to regenerate it
    #[error("request body is not replayable: no body factory was provided")]
    BodyNotReplayable,

    /// The body factory failed to regenerate the request body
    #[error("failed to regenerate request body: {0}")]
    Replay(#[source] BoxError),

    /// Reading a response body failed
    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Error {
    /// Create a cancellation error
    pub fn cancelled(attempts: u32) -> Self {
        Self::Cancelled { attempts }
    }

    /// Create a drain error
    pub fn drain(source: impl Into<BoxError>) -> Self {
        Self::Drain(source.into())
    }

    /// Create a body replay error
    pub fn replay(source: impl Into<BoxError>) -> Self {
        Self::Replay(source.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check if the request was cancelled while waiting to retry
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Check if this is a drain or replay failure
    ///
    /// Resource errors abort the attempt loop immediately and are never
    /// retried.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Error::Drain(_) | Error::BodyNotReplayable | Error::Replay(_)
        )
    }

    /// Check if this error came from the underlying transport
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Get the transport error, if any
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Error::Transport(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_cancelled_error() {
        let err = Error::cancelled(2);

        assert!(err.is_cancelled());
        assert!(!err.is_resource_error());
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "request cancelled after 2 attempts");
    }

    #[test]
    fn test_resource_errors() {
        let drain = Error::drain(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        let replay = Error::replay("factory failed");

        assert!(drain.is_resource_error());
        assert!(replay.is_resource_error());
        assert!(Error::BodyNotReplayable.is_resource_error());
        assert!(drain.to_string().contains("reset"));
    }

    #[test]
    fn test_transport_error_passthrough() {
        let err: Error = TransportError::connect("connection refused").into();

        assert!(err.is_transport());
        assert!(matches!(
            err.as_transport(),
            Some(TransportError::Connect(msg)) if msg == "connection refused"
        ));
        assert_eq!(err.to_string(), "connection failed: connection refused");
    }

    #[test]
    fn test_invalid_config_display() {
        let err = Error::invalid_config("jitter must be in [0, 1)");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: jitter must be in [0, 1)"
        );
    }
}
