//! Retry policy value
//!
//! A [`RetryPolicy`] groups everything the attempt loop needs to decide:
//! the predicate, the backoff strategy, the retry budget, the delay bounds
//! and the jitter factor. `RetryPolicy::default()` is the zero policy, which
//! executors replace with [`RetryPolicy::standard`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::backoff::{Backoff, ExponentialBackoff};
use super::predicate::{NeverRetry, ShouldRetry, StandardRetry};
use crate::error::{Error, Result};
use crate::transport::Outcome;

/// Default maximum number of retries
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default lower delay bound
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);

/// Default upper delay bound
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Default jitter factor
pub const DEFAULT_JITTER: f64 = 0.2;

/// Retry configuration for a [`RetryTransport`](crate::RetryTransport)
///
/// A missing `predicate` means "never retry" and a missing `backoff` means
/// "no delay"; neither is an error.
#[derive(Clone, Default)]
pub struct RetryPolicy {
    /// Decides whether an outcome is retried
    pub predicate: Option<Arc<dyn ShouldRetry>>,
    /// Computes the delay before each retry
    pub backoff: Option<Arc<dyn Backoff>>,
    /// Retries after the first attempt; `0` means a single attempt
    pub max_retries: u32,
    /// Lower delay bound passed to the backoff strategy
    pub min_delay: Duration,
    /// Upper delay bound; no computed delay exceeds it
    pub max_delay: Duration,
    /// Fraction of each delay to randomize, in `[0, 1)`
    pub jitter: f64,
}

impl RetryPolicy {
    /// The built-in default policy
    ///
    /// Standard predicate, exponential backoff, 3 retries, 500 ms to 5 s,
    /// jitter 0.2.
    pub fn standard() -> Self {
        Self {
            predicate: Some(Arc::new(StandardRetry)),
            backoff: Some(Arc::new(ExponentialBackoff)),
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: DEFAULT_JITTER,
        }
    }

    /// A policy that never retries
    pub fn never() -> Self {
        Self {
            predicate: Some(Arc::new(NeverRetry)),
            ..Self::default()
        }
    }

    /// Check whether no field other than jitter has been set
    pub fn is_zero(&self) -> bool {
        self.predicate.is_none()
            && self.backoff.is_none()
            && self.max_retries == 0
            && self.min_delay.is_zero()
            && self.max_delay.is_zero()
    }

    /// Substitute the standard policy for a zero policy
    pub fn or_standard(self) -> Self {
        if self.is_zero() {
            Self::standard()
        } else {
            self
        }
    }

    /// Decide whether an outcome is retried; false without a predicate
    pub fn should_retry(&self, outcome: &Outcome) -> bool {
        self.predicate
            .as_ref()
            .is_some_and(|predicate| predicate.should_retry(outcome))
    }

    /// Compute the delay before retry number `attempt + 1`; zero without a
    /// backoff strategy
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.as_ref().map_or(Duration::ZERO, |backoff| {
            backoff.delay(self.min_delay, self.max_delay, self.jitter, attempt)
        })
    }

    /// Total attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Set the predicate
    pub fn with_predicate(mut self, predicate: impl ShouldRetry + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Set the backoff strategy
    pub fn with_backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay bounds
    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    /// Set the jitter factor
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Check the delay bounds and jitter range
    pub fn validate(&self) -> Result<()> {
        if self.max_delay < self.min_delay {
            return Err(Error::invalid_config(format!(
                "max delay ({:?}) must not be less than min delay ({:?})",
                self.max_delay, self.min_delay
            )));
        }
        if !(0.0..1.0).contains(&self.jitter) {
            return Err(Error::invalid_config(format!(
                "jitter must be in [0, 1), got {}",
                self.jitter
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("predicate", &self.predicate.as_ref().map(|_| ".."))
            .field("backoff", &self.backoff.as_ref().map(|_| ".."))
            .field("max_retries", &self.max_retries)
            .field("min_delay", &self.min_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter", &self.jitter)
            .finish()
    }
}
