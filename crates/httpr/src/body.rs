//! Request and response bodies
//!
//! A [`Body`] is either held in memory or backed by a one-shot stream of
//! chunks. In-memory bodies can be cloned freely; stream bodies can be read
//! exactly once and must be regenerated through a [`BodyFactory`] to be sent
//! again.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{Stream, StreamExt, TryStreamExt};

use crate::error::BoxError;

type BoxStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Regenerates a fresh, unread request body for each retried attempt
pub type BodyFactory = Arc<dyn Fn() -> Result<Body, BoxError> + Send + Sync>;

/// An HTTP message body
pub struct Body {
    inner: Inner,
}

enum Inner {
    Full(Bytes),
    Stream(BoxStream),
}

impl Body {
    /// Create an empty body
    pub fn empty() -> Self {
        Self {
            inner: Inner::Full(Bytes::new()),
        }
    }

    /// Wrap a stream of chunks into a one-shot body
    ///
    /// Stream bodies cannot be cloned. Pair them with a [`BodyFactory`] via
    /// [`Request::with_body_factory`](crate::Request::with_body_factory) if
    /// the request may need to be retried.
    pub fn wrap_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            inner: Inner::Stream(Box::pin(stream.map_err(|err| -> BoxError { err.into() }))),
        }
    }

    /// Get the bytes of an in-memory body
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.inner {
            Inner::Full(bytes) => Some(bytes),
            Inner::Stream(_) => None,
        }
    }

    /// Get a cheap handle to the bytes of an in-memory body
    pub fn to_bytes(&self) -> Option<Bytes> {
        match &self.inner {
            Inner::Full(bytes) => Some(bytes.clone()),
            Inner::Stream(_) => None,
        }
    }

    /// Check whether the body is backed by a one-shot stream
    pub fn is_stream(&self) -> bool {
        matches!(self.inner, Inner::Stream(_))
    }

    /// Clone an in-memory body; returns `None` for stream bodies
    pub fn try_clone(&self) -> Option<Body> {
        match &self.inner {
            Inner::Full(bytes) => Some(Body {
                inner: Inner::Full(bytes.clone()),
            }),
            Inner::Stream(_) => None,
        }
    }

    /// Read the next chunk, or `None` once the body is exhausted
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, BoxError> {
        match &mut self.inner {
            Inner::Full(bytes) if bytes.is_empty() => Ok(None),
            Inner::Full(bytes) => Ok(Some(std::mem::take(bytes))),
            Inner::Stream(stream) => stream.next().await.transpose(),
        }
    }

    /// Read the whole body into memory
    pub async fn collect(self) -> Result<Bytes, BoxError> {
        match self.inner {
            Inner::Full(bytes) => Ok(bytes),
            Inner::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.try_next().await? {
                    buf.extend_from_slice(&chunk);
                }
                Ok(buf.freeze())
            }
        }
    }

    pub(crate) fn into_reqwest(self) -> reqwest::Body {
        match self.inner {
            Inner::Full(bytes) => reqwest::Body::from(bytes),
            Inner::Stream(stream) => reqwest::Body::wrap_stream(stream),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Full(bytes) => f.debug_tuple("Body").field(&bytes.len()).finish(),
            Inner::Stream(_) => f.write_str("Body(stream)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            inner: Inner::Full(bytes),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(vec: Vec<u8>) -> Self {
        Bytes::from(vec).into()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Bytes::from_static(s.as_bytes()).into()
    }
}

impl From<&'static [u8]> for Body {
    fn from(slice: &'static [u8]) -> Self {
        Bytes::from_static(slice).into()
    }
}
