//! Retry observation and logging
//!
//! [`RetryObserver`] receives a callback at each step of the attempt loop.
//! Observers only watch: nothing they do changes whether or when a request
//! is retried, and they never see an outcome they could take ownership of.
//! [`TracingObserver`] is the executor's default and logs through `tracing`.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::transport::Outcome;

/// Observer trait for retry loop events
///
/// # Example
///
/// ```rust
/// use httpr::retry::RetryObserver;
/// use httpr::transport::Outcome;
/// use std::time::Duration;
///
/// struct MetricsObserver;
///
/// impl RetryObserver for MetricsObserver {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
///         // Record attempt start metric
///     }
///
///     fn on_attempt_failed(&self, attempt: u32, outcome: &Outcome, delay: Duration) {
///         // Record retry metric
///     }
///
///     fn on_completed(&self, attempt: u32, outcome: &Outcome, elapsed: Duration) {
///         // Record latency
///     }
///
///     fn on_exhausted(&self, attempts: u32, outcome: &Outcome) {
///         // Record exhaustion metric
///     }
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called before each attempt is sent
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    /// * `max_attempts` - `max_retries + 1`
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called when an attempt's outcome will be retried
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that failed (1-indexed)
    /// * `outcome` - The retryable outcome
    /// * `delay` - The backoff before the next attempt
    fn on_attempt_failed(&self, attempt: u32, outcome: &Outcome, delay: Duration);

    /// Called when the predicate accepts an outcome as final
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that produced the outcome (1-indexed)
    /// * `outcome` - The final outcome; may be an error or a non-2xx response
    /// * `elapsed` - Total time spent across all attempts
    fn on_completed(&self, attempt: u32, outcome: &Outcome, elapsed: Duration);

    /// Called when the outcome is still retryable but no retries remain
    fn on_exhausted(&self, attempts: u32, outcome: &Outcome);

    /// Called when cancellation interrupts the wait before a retry
    fn on_cancelled(&self, attempt: u32) {
        let _ = attempt;
    }

    /// Called when draining or replaying fails and the loop aborts
    fn on_aborted(&self, attempt: u32, error: &Error) {
        let _ = (attempt, error);
    }
}

/// Formats an outcome as either its status or its transport error
struct OutcomeSummary<'a>(&'a Outcome);

impl fmt::Display for OutcomeSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Ok(response) => write!(f, "status {}", response.status()),
            Err(err) => write!(f, "{}", err),
        }
    }
}

/// A no-op observer
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _outcome: &Outcome, _delay: Duration) {}

    fn on_completed(&self, _attempt: u32, _outcome: &Outcome, _elapsed: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _outcome: &Outcome) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_attempt_failed`: WARN
/// - `on_completed`: INFO after retries, DEBUG on the first attempt
/// - `on_exhausted`: ERROR
/// - `on_cancelled`: WARN
/// - `on_aborted`: ERROR
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    ///
    /// # Arguments
    ///
    /// * `operation` - Name attached to every event as the `operation` field
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("http")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            max_attempts = max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, outcome: &Outcome, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            outcome = %OutcomeSummary(outcome),
            delay_ms = delay.as_millis() as u64,
            "attempt failed, will retry"
        );
    }

    fn on_completed(&self, attempt: u32, outcome: &Outcome, elapsed: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt = attempt,
                outcome = %OutcomeSummary(outcome),
                total_duration_ms = elapsed.as_millis() as u64,
                "completed after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                outcome = %OutcomeSummary(outcome),
                duration_ms = elapsed.as_millis() as u64,
                "completed on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, outcome: &Outcome) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            outcome = %OutcomeSummary(outcome),
            "all retry attempts exhausted"
        );
    }

    fn on_cancelled(&self, attempt: u32) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            "retry cancelled while waiting"
        );
    }

    fn on_aborted(&self, attempt: u32, error: &Error) {
        tracing::error!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "retry aborted"
        );
    }
}

/// An observer that counts retry events
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    /// Attempt start events
    pub attempt_starts: AtomicU32,
    /// Retried attempt events
    pub failures: AtomicU32,
    /// Completion events
    pub completions: AtomicU32,
    /// Exhaustion events
    pub exhaustions: AtomicU32,
    /// Cancellation events
    pub cancellations: AtomicU32,
    /// Abort events
    pub aborts: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempts started
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Get the number of failed attempts that were retried
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Get the number of requests completed without exhausting retries
    pub fn completions(&self) -> u32 {
        self.completions.load(Ordering::SeqCst)
    }

    /// Get the number of requests that ran out of retries
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    /// Get the number of requests cancelled
    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }

    /// Get the number of requests aborted by a drain or replay failure
    pub fn aborts(&self) -> u32 {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _outcome: &Outcome, _delay: Duration) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_completed(&self, _attempt: u32, _outcome: &Outcome, _elapsed: Duration) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _outcome: &Outcome) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempt: u32) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }

    fn on_aborted(&self, _attempt: u32, _error: &Error) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, outcome: &Outcome, delay: Duration) {
        (**self).on_attempt_failed(attempt, outcome, delay)
    }

    fn on_completed(&self, attempt: u32, outcome: &Outcome, elapsed: Duration) {
        (**self).on_completed(attempt, outcome, elapsed)
    }

    fn on_exhausted(&self, attempts: u32, outcome: &Outcome) {
        (**self).on_exhausted(attempts, outcome)
    }

    fn on_cancelled(&self, attempt: u32) {
        (**self).on_cancelled(attempt)
    }

    fn on_aborted(&self, attempt: u32, error: &Error) {
        (**self).on_aborted(attempt, error)
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, outcome: &Outcome, delay: Duration) {
        (**self).on_attempt_failed(attempt, outcome, delay)
    }

    fn on_completed(&self, attempt: u32, outcome: &Outcome, elapsed: Duration) {
        (**self).on_completed(attempt, outcome, elapsed)
    }

    fn on_exhausted(&self, attempts: u32, outcome: &Outcome) {
        (**self).on_exhausted(attempts, outcome)
    }

    fn on_cancelled(&self, attempt: u32) {
        (**self).on_cancelled(attempt)
    }

    fn on_aborted(&self, attempt: u32, error: &Error) {
        (**self).on_aborted(attempt, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;
    use crate::transport::TransportError;
    use reqwest::StatusCode;

    fn unavailable() -> Outcome {
        Ok(Response::new(StatusCode::SERVICE_UNAVAILABLE, ""))
    }

    #[test]
    fn test_outcome_summary() {
        assert_eq!(
            OutcomeSummary(&unavailable()).to_string(),
            "status 503 Service Unavailable"
        );
        assert_eq!(
            OutcomeSummary(&Err(TransportError::connect("refused"))).to_string(),
            "connection failed: refused"
        );
    }

    #[test]
    fn test_stats_observer() {
        let observer = StatsObserver::new();
        let outcome = unavailable();

        observer.on_attempt_start(1, 4);
        observer.on_attempt_failed(1, &outcome, Duration::from_millis(500));
        observer.on_attempt_start(2, 4);
        observer.on_completed(2, &outcome, Duration::from_millis(600));

        assert_eq!(observer.attempt_starts(), 2);
        assert_eq!(observer.failures(), 1);
        assert_eq!(observer.completions(), 1);
        assert_eq!(observer.exhaustions(), 0);
    }

    #[test]
    fn test_stats_observer_cancel_and_abort() {
        let observer = StatsObserver::new();

        observer.on_cancelled(2);
        observer.on_aborted(1, &Error::BodyNotReplayable);

        assert_eq!(observer.cancellations(), 1);
        assert_eq!(observer.aborts(), 1);
    }

    #[test]
    fn test_noop_default_callbacks() {
        let observer = NoOpObserver;
        let outcome = unavailable();

        observer.on_attempt_start(1, 1);
        observer.on_exhausted(1, &outcome);
        observer.on_cancelled(1);
        observer.on_aborted(1, &Error::BodyNotReplayable);
    }

    #[test]
    fn test_tracing_observer_creation() {
        assert_eq!(TracingObserver::new("upload").operation(), "upload");
        assert_eq!(TracingObserver::default().operation(), "http");
    }

    #[test]
    fn test_arc_observer() {
        let stats = Arc::new(StatsObserver::new());
        let observer: Box<dyn RetryObserver> = Box::new(stats.clone());

        observer.on_attempt_start(1, 4);
        observer.on_exhausted(4, &unavailable());

        assert_eq!(stats.attempt_starts(), 1);
        assert_eq!(stats.exhaustions(), 1);
    }
}
