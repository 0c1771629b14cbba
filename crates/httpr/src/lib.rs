//! # httpr
//!
//! Retrying HTTP transport providing:
//! - A retry decorator over any single-attempt transport
//! - Pluggable retry predicates and stateless backoff strategies
//! - Request body replay and draining of discarded responses
//! - Cancellation of the wait between attempts
//! - YAML and environment configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use httpr::{Request, RetryTransport};
//!
//! async fn example() -> httpr::Result<()> {
//!     let transport = RetryTransport::new();
//!
//!     let response = transport
//!         .perform(Request::post("https://example.com/items")?.with_body(r#"{"name":"a"}"#))
//!         .await?;
//!     println!("{}", response.text().await?);
//!     Ok(())
//! }
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use body::{Body, BodyFactory};
pub use config::{ConfigLoader, HttprConfig};
pub use error::{BoxError, Error, Result};
pub use request::{Replay, Request};
pub use response::{drain, Response};
pub use retry::{RetryPolicy, RetryTransport, RetryTransportBuilder};
pub use transport::{Outcome, ReqwestTransport, RoundTrip, TransportError};
