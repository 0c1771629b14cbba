//! Backoff strategies
//!
//! A strategy maps `(min_delay, max_delay, jitter, attempt)` to the delay
//! before the next attempt. `attempt` is the number of retries already
//! performed, so the first retry sees `0`. Strategies receive `&self` only
//! and must not count attempts themselves: one strategy value serves every
//! concurrent request on an executor.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Computes the delay before the next attempt
pub trait Backoff: Send + Sync {
    /// Delay before retry number `attempt + 1`
    fn delay(
        &self,
        min_delay: Duration,
        max_delay: Duration,
        jitter: f64,
        attempt: u32,
    ) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(Duration, Duration, f64, u32) -> Duration + Send + Sync,
{
    fn delay(
        &self,
        min_delay: Duration,
        max_delay: Duration,
        jitter: f64,
        attempt: u32,
    ) -> Duration {
        self(min_delay, max_delay, jitter, attempt)
    }
}

/// The deterministic part of exponential backoff
///
/// Returns `min(min_delay * 2^attempt, max_delay)`. Overflow saturates to
/// `max_delay`.
pub fn exponential_delay(min_delay: Duration, max_delay: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| min_delay.checked_mul(factor))
        .map_or(max_delay, |delay| delay.min(max_delay))
}

/// Largest jitter fraction applied; larger values are clamped to it
pub const MAX_JITTER: f64 = 1.0 - f64::EPSILON;

/// Randomize a capped delay by up to `jitter` of its value
///
/// Adds a uniform offset from `[-jitter * delay, +jitter * delay)` and clamps
/// the result to `[0, max_delay]`. Jitter above [`MAX_JITTER`] is clamped to
/// it. A zero, negative, or non-finite jitter leaves the delay unchanged, as
/// does a zero delay or a span too small to represent.
///
/// # Arguments
///
/// * `delay` - The capped, non-jittered delay
/// * `max_delay` - Ceiling the jittered delay may not exceed
/// * `jitter` - Fraction of `delay` to randomize, in `[0, 1)`
pub fn apply_jitter(delay: Duration, max_delay: Duration, jitter: f64) -> Duration {
    if !jitter.is_finite() || jitter <= 0.0 || delay.is_zero() {
        return delay;
    }

    let base = delay.as_secs_f64();
    let span = base * jitter.min(MAX_JITTER);
    if !span.is_finite() || span <= 0.0 {
        return delay;
    }
    let offset = rand::rng().random_range(-span..span);
    let jittered = (base + offset).clamp(0.0, max_delay.as_secs_f64());

    Duration::try_from_secs_f64(jittered).map_or(max_delay, |d| d.min(max_delay))
}

/// `min_delay * 2^attempt`, capped at `max_delay`, then jittered
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialBackoff;

impl Backoff for ExponentialBackoff {
    fn delay(
        &self,
        min_delay: Duration,
        max_delay: Duration,
        jitter: f64,
        attempt: u32,
    ) -> Duration {
        apply_jitter(exponential_delay(min_delay, max_delay, attempt), max_delay, jitter)
    }
}

/// `min_delay` on every attempt, capped at `max_delay`, then jittered
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantBackoff;

impl Backoff for ConstantBackoff {
    fn delay(
        &self,
        min_delay: Duration,
        max_delay: Duration,
        jitter: f64,
        _attempt: u32,
    ) -> Duration {
        apply_jitter(min_delay.min(max_delay), max_delay, jitter)
    }
}

/// `min_delay * (attempt + 1)`, capped at `max_delay`, then jittered
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBackoff;

impl Backoff for LinearBackoff {
    fn delay(
        &self,
        min_delay: Duration,
        max_delay: Duration,
        jitter: f64,
        attempt: u32,
    ) -> Duration {
        let delay = attempt
            .checked_add(1)
            .and_then(|factor| min_delay.checked_mul(factor))
            .map_or(max_delay, |delay| delay.min(max_delay));
        apply_jitter(delay, max_delay, jitter)
    }
}

/// Retry immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn delay(&self, _min: Duration, _max: Duration, _jitter: f64, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Backoff strategy names accepted in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffKind {
    #[default]
    Exponential,
    Constant,
    Linear,
    None,
}

impl BackoffKind {
    /// Get the strategy for this kind
    pub fn strategy(self) -> Arc<dyn Backoff> {
        match self {
            BackoffKind::Exponential => Arc::new(ExponentialBackoff),
            BackoffKind::Constant => Arc::new(ConstantBackoff),
            BackoffKind::Linear => Arc::new(LinearBackoff),
            BackoffKind::None => Arc::new(NoBackoff),
        }
    }
}

impl fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffKind::Exponential => write!(f, "exponential"),
            BackoffKind::Constant => write!(f, "constant"),
            BackoffKind::Linear => write!(f, "linear"),
            BackoffKind::None => write!(f, "none"),
        }
    }
}
