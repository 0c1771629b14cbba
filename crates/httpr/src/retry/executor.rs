//! Retrying transport
//!
//! [`RetryTransport`] decorates any [`RoundTrip`] with retries. Each call to
//! [`perform`](RetryTransport::perform) runs its own attempt loop; the
//! executor holds configuration only, so one instance can serve many
//! concurrent callers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use super::observer::{RetryObserver, TracingObserver};
use super::policy::RetryPolicy;
use crate::config::HttprConfig;
use crate::error::{Error, Result};
use crate::request::{Replay, Request};
use crate::response::{drain, Response};
use crate::transport::{Outcome, ReqwestTransport, RoundTrip, TransportError};

/// An HTTP transport that retries transient failures
///
/// # Example
///
/// ```rust,no_run
/// use httpr::{Request, RetryPolicy, RetryTransport};
///
/// async fn example() -> httpr::Result<()> {
///     let transport = RetryTransport::builder()
///         .retry_policy(RetryPolicy::standard().with_max_retries(5))
///         .build();
///
///     let response = transport.perform(Request::get("https://example.com")?).await?;
///     println!("{}", response.status());
///     Ok(())
/// }
/// ```
pub struct RetryTransport {
    policy: RetryPolicy,
    transport: Arc<dyn RoundTrip>,
    observer: Arc<dyn RetryObserver>,
}

impl RetryTransport {
    /// Create a retrying transport with the standard policy over a default
    /// [`ReqwestTransport`]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a retrying transport
    pub fn builder() -> RetryTransportBuilder {
        RetryTransportBuilder::new()
    }

    /// Build a retrying transport from loaded configuration
    pub fn from_config(config: &HttprConfig) -> Result<Self> {
        let transport = ReqwestTransport::from_config(&config.network)?;
        let policy = config.retry.to_policy()?;

        Ok(Self::builder()
            .transport(transport)
            .retry_policy(policy)
            .build())
    }

    /// Get the active retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Replace the retry policy; a zero policy restores the standard one
    ///
    /// An out-of-range policy is logged and kept; its jitter is clamped when
    /// delays are computed.
    pub fn set_retry_policy(&mut self, policy: RetryPolicy) {
        self.policy = checked(policy.or_standard());
    }

    /// Replace the underlying transport
    pub fn set_transport(&mut self, transport: impl RoundTrip + 'static) {
        self.transport = Arc::new(transport);
    }

    /// Stop retrying: every request gets exactly one attempt
    pub fn set_no_retry(&mut self) {
        self.policy = RetryPolicy::never();
    }

    /// Send a request, retrying according to the policy
    ///
    /// Returns the final outcome once the predicate accepts it or retries
    /// run out. A retryable response that exhausts the retries is returned
    /// as `Ok`; a transport error on the last attempt as
    /// [`Error::Transport`].
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if the request's cancellation token fires
    ///   while waiting to retry or aborts an attempt in flight
    /// - [`Error::Drain`] if a discarded response cannot be read to the end
    /// - [`Error::BodyNotReplayable`] or [`Error::Replay`] if the body cannot
    ///   be regenerated for a retry
    pub async fn perform(&self, request: Request) -> Result<Response> {
        let start = Instant::now();
        let max_attempts = self.policy.max_attempts();
        let replay = Replay::from(&request);
        let cancel = request.cancellation().clone();

        let mut request = request;
        let mut retries: u32 = 0;

        loop {
            let attempt = retries + 1;
            self.observer.on_attempt_start(attempt, max_attempts);

            let outcome = self.transport.round_trip(request).await;

            // An attempt aborted by the token surfaces as cancellation
            let aborted = outcome.as_ref().is_err_and(TransportError::is_cancelled);
            if aborted && cancel.is_cancelled() {
                self.observer.on_cancelled(attempt);
                return Err(Error::cancelled(attempt));
            }

            if !self.policy.should_retry(&outcome) {
                self.observer.on_completed(attempt, &outcome, start.elapsed());
                return outcome.map_err(Error::from);
            }

            // Checked before any delay: never sleep only to give up
            if retries >= self.policy.max_retries {
                self.observer.on_exhausted(attempt, &outcome);
                return outcome.map_err(Error::from);
            }

            let delay = self.policy.delay(retries);
            self.observer.on_attempt_failed(attempt, &outcome, delay);

            // Returning from here drops `outcome`, which releases its body
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.observer.on_cancelled(attempt);
                    return Err(Error::cancelled(attempt));
                }
                _ = tokio::time::sleep(delay) => {}
            }

            if let Err(err) = drain(outcome.ok()).await {
                self.observer.on_aborted(attempt, &err);
                return Err(err);
            }

            request = match replay.next_request() {
                Ok(next) => next,
                Err(err) => {
                    self.observer.on_aborted(attempt, &err);
                    return Err(err);
                }
            };
            retries += 1;
        }
    }
}

fn checked(policy: RetryPolicy) -> RetryPolicy {
    if let Err(err) = policy.validate() {
        tracing::warn!(error = %err, "Retry policy out of range; jitter will be clamped");
    }
    policy
}

impl Default for RetryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RetryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransport")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RoundTrip for RetryTransport {
    async fn round_trip(&self, request: Request) -> Outcome {
        self.perform(request).await.map_err(|err| match err {
            Error::Transport(err) => err,
            Error::Cancelled { .. } => TransportError::Cancelled,
            other => TransportError::other(other),
        })
    }
}

/// Builder for [`RetryTransport`]
///
/// Options apply in call order; a later call overrides an earlier one for
/// the same setting. A zero policy passed to
/// [`retry_policy`](Self::retry_policy) is ignored.
///
/// # Example
///
/// ```rust
/// use httpr::retry::{RetryTransport, TracingObserver};
/// use httpr::ReqwestTransport;
///
/// let transport = RetryTransport::builder()
///     .transport(ReqwestTransport::new())
///     .observer(TracingObserver::new("billing-api"))
///     .no_retry()
///     .build();
///
/// assert_eq!(transport.policy().max_retries, 0);
/// ```
pub struct RetryTransportBuilder {
    policy: RetryPolicy,
    transport: Option<Arc<dyn RoundTrip>>,
    observer: Arc<dyn RetryObserver>,
}

impl RetryTransportBuilder {
    /// Create a builder with the standard policy and default transport
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            transport: None,
            observer: Arc::new(TracingObserver::default()),
        }
    }

    /// Set the retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        if !policy.is_zero() {
            self.policy = policy;
        }
        self
    }

    /// Set the underlying transport
    pub fn transport(mut self, transport: impl RoundTrip + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Never retry
    pub fn no_retry(mut self) -> Self {
        self.policy = RetryPolicy::never();
        self
    }

    /// Set the observer
    pub fn observer(mut self, observer: impl RetryObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Build the transport
    pub fn build(self) -> RetryTransport {
        RetryTransport {
            policy: checked(self.policy.or_standard()),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
            observer: self.observer,
        }
    }
}

impl Default for RetryTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
