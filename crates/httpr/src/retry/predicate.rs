//! Retry predicates
//!
//! A predicate inspects the outcome of one attempt and decides whether the
//! request should be tried again. Predicates take `&self` and keep no state
//! between calls, so one value can be shared by every request an executor
//! handles.

use reqwest::StatusCode;

use crate::transport::Outcome;

/// Status codes retried by [`StandardRetry`]
pub const STANDARD_RETRY_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Decides whether an attempt outcome warrants another attempt
///
/// Closures of the form `Fn(&Outcome) -> bool` implement this trait, so a
/// one-off predicate does not need its own type.
///
/// # Example
///
/// ```rust
/// use httpr::retry::ShouldRetry;
/// use httpr::transport::Outcome;
///
/// // Retry only when no response came back at all
/// let transport_only = |outcome: &Outcome| outcome.is_err();
/// assert!(transport_only.should_retry(&Err(httpr::TransportError::connect("refused"))));
/// ```
pub trait ShouldRetry: Send + Sync {
    /// Return true if the request should be attempted again
    fn should_retry(&self, outcome: &Outcome) -> bool;
}

impl<F> ShouldRetry for F
where
    F: Fn(&Outcome) -> bool + Send + Sync,
{
    fn should_retry(&self, outcome: &Outcome) -> bool {
        self(outcome)
    }
}

/// The standard retry decision
///
/// Transport errors are always retried. Responses are retried when their
/// status is 408, 429, 500, 502, 503 or 504.
pub fn standard_should_retry(outcome: &Outcome) -> bool {
    match outcome {
        Err(_) => true,
        Ok(response) => is_standard_retry_status(response.status()),
    }
}

fn is_standard_retry_status(status: StatusCode) -> bool {
    STANDARD_RETRY_STATUSES.contains(&status.as_u16())
}

/// Predicate implementing [`standard_should_retry`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRetry;

impl ShouldRetry for StandardRetry {
    fn should_retry(&self, outcome: &Outcome) -> bool {
        standard_should_retry(outcome)
    }
}

/// A predicate that never retries
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl ShouldRetry for NeverRetry {
    fn should_retry(&self, _outcome: &Outcome) -> bool {
        false
    }
}

/// Retries transport errors and a configured set of status codes
#[derive(Debug, Clone)]
pub struct StatusRetry {
    retryable_codes: Vec<u16>,
}

impl StatusRetry {
    /// Create a predicate retrying the given status codes
    pub fn new(codes: impl Into<Vec<u16>>) -> Self {
        Self {
            retryable_codes: codes.into(),
        }
    }

    /// Create a predicate with the standard status codes
    pub fn default_http() -> Self {
        Self::new(STANDARD_RETRY_STATUSES)
    }

    /// Check if a status code is retryable
    pub fn is_retryable_code(&self, code: u16) -> bool {
        self.retryable_codes.contains(&code)
    }

    /// Get the retryable status codes
    pub fn codes(&self) -> &[u16] {
        &self.retryable_codes
    }
}

impl ShouldRetry for StatusRetry {
    fn should_retry(&self, outcome: &Outcome) -> bool {
        match outcome {
            Err(_) => true,
            Ok(response) => self.is_retryable_code(response.status().as_u16()),
        }
    }
}
