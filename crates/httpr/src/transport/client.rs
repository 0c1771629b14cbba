//! Default transport backed by reqwest

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::{Outcome, RoundTrip, TransportError};
use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;

/// Sends each attempt through a shared [`reqwest::Client`]
///
/// The client's connection pool is reused across attempts and requests.
/// Response bodies are streamed, so a discarded response must be drained
/// before its connection returns to the pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client from network settings
    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| Error::invalid_config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Get the underlying client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl RoundTrip for ReqwestTransport {
    async fn round_trip(&self, request: Request) -> Outcome {
        let cancel = request.cancellation().clone();
        let method = request.method().clone();
        let url = request.url().clone();

        trace!(method = %method, url = %url, "Sending request");
        let request = request.into_reqwest();

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(method = %method, url = %url, "Request cancelled in flight");
                Err(TransportError::Cancelled)
            }
            result = self.client.execute(request) => {
                let response = result.map_err(|e| {
                    debug!(method = %method, url = %url, error = %e, "Request failed");
                    TransportError::from(e)
                })?;
                debug!(
                    method = %method,
                    url = %url,
                    status = %response.status(),
                    "Received response"
                );
                Ok(Response::from_reqwest(response))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_from_config() {
        let config = NetworkConfig {
            timeout_secs: Some(30),
            connect_timeout_secs: Some(5),
            ..Default::default()
        };
        assert!(ReqwestTransport::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let token = CancellationToken::new();
        token.cancel();

        // Port 9 (discard) on loopback is never contacted: cancellation wins.
        let request = Request::get("http://127.0.0.1:9/")
            .unwrap()
            .with_cancellation(token);

        let outcome = ReqwestTransport::new().round_trip(request).await;
        assert!(matches!(outcome, Err(TransportError::Cancelled)));
    }
}
