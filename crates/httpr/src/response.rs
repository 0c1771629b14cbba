//! Attempt responses and draining

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url, Version};
use serde::de::DeserializeOwned;

use crate::body::Body;
use crate::error::{BoxError, Error, Result};

/// The response produced by one attempt
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: Option<Url>,
    body: Body,
}

impl Response {
    /// Create a response with the given status and body
    pub fn new(status: StatusCode, body: impl Into<Body>) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            url: None,
            body: body.into(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the URL the response was served from
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub(crate) fn from_reqwest(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            version: response.version(),
            headers: response.headers().clone(),
            url: Some(response.url().clone()),
            body: Body::wrap_stream(response.bytes_stream()),
        }
    }

    /// Get the status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the URL the response was served from, if known
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Read the next body chunk
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        self.body.chunk().await.map_err(Error::Body)
    }

    /// Read the whole body
    pub async fn bytes(self) -> Result<Bytes> {
        self.body.collect().await.map_err(Error::Body)
    }

    /// Read the whole body as UTF-8 text, replacing invalid sequences
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Deserialize the body as JSON
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read the body to completion, discarding it
    ///
    /// Returns the number of bytes discarded. The body is released when this
    /// returns, whether reading succeeded or not.
    pub async fn drain(mut self) -> std::result::Result<u64, BoxError> {
        let mut discarded = 0u64;
        while let Some(chunk) = self.body.chunk().await? {
            discarded += chunk.len() as u64;
        }
        Ok(discarded)
    }
}

/// Drain a response that is about to be discarded
///
/// An absent response (the attempt failed at the transport level) is a
/// no-op. A read failure leaves the connection in an unknown state and is
/// reported as [`Error::Drain`].
pub async fn drain(response: Option<Response>) -> Result<()> {
    let Some(response) = response else {
        return Ok(());
    };

    let status = response.status();
    let discarded = response.drain().await.map_err(Error::Drain)?;
    tracing::trace!(status = %status, discarded, "Drained discarded response");
    Ok(())
}
