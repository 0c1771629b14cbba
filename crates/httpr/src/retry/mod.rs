//! Retry engine for HTTP requests
//!
//! [`RetryTransport`] wraps an underlying [`RoundTrip`](crate::RoundTrip)
//! and re-issues requests whose outcome the policy's predicate marks as
//! transient.
//!
//! # Features
//!
//! - Standard predicate: transport errors and 408, 429, 500, 502, 503, 504
//! - Stateless backoff strategies: exponential (default), constant, linear, none
//! - Jitter bounded by the policy's delay ceiling
//! - Cancellable waits between attempts
//! - Request body replay through body factories
//! - Observable attempts via the `RetryObserver` trait
//!
//! # Example
//!
//! ```rust,no_run
//! use httpr::retry::{RetryPolicy, RetryTransport, StatusRetry};
//! use httpr::Request;
//!
//! async fn example() -> httpr::Result<()> {
//!     let transport = RetryTransport::builder()
//!         .retry_policy(RetryPolicy::standard().with_predicate(StatusRetry::new(vec![503])))
//!         .build();
//!
//!     let response = transport.perform(Request::get("https://example.com/health")?).await?;
//!     assert!(response.status().is_success());
//!     Ok(())
//! }
//! ```

mod backoff;
mod executor;
mod observer;
mod policy;
mod predicate;

pub use backoff::{
    apply_jitter, exponential_delay, Backoff, BackoffKind, ConstantBackoff, ExponentialBackoff,
    LinearBackoff, NoBackoff, MAX_JITTER,
};
pub use executor::{RetryTransport, RetryTransportBuilder};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use policy::{
    RetryPolicy, DEFAULT_JITTER, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_MIN_DELAY,
};
pub use predicate::{
    standard_should_retry, NeverRetry, ShouldRetry, StandardRetry, StatusRetry,
    STANDARD_RETRY_STATUSES,
};
