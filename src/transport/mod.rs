//! Transport boundary.
//!
//! The engine hands a finished [`BoundRequest`] to a [`Transport`] and gets a
//! [`RawResponse`] back. Socket I/O and TLS live behind this trait; the
//! reqwest-backed [`HttpTransport`] is the default.

pub mod http;

use async_trait::async_trait;
use bytes::Bytes;

use crate::request::{BoundRequest, Headers};
use crate::Result;

pub use http::{HttpTransport, HttpTransportConfig};

/// Status, headers and body of one exchange, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends bound requests. Implementations must be safe for concurrent,
/// independent requests; the engine adds no locking around them.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: BoundRequest) -> Result<RawResponse>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out: {0}")]
    TimedOut(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout(),
            TransportError::TimedOut(_) => true,
            TransportError::Other(_) => false,
        }
    }
}
