// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document sinks selected by URI

mod dir;
mod document;
mod http;
mod memory;

pub use dir::DirSink;
pub use document::apply_upsert;
pub use http::{HttpSink, DEFAULT_REQUEST_TIMEOUT};
pub use memory::MemorySink;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeConnector, FakeSink, SinkCall};

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors from sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unsupported sink scheme: {0}")]
    UnsupportedScheme(String),
    #[error("invalid sink uri: {0}")]
    InvalidUri(String),
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
    #[error("invalid field path: {0:?}")]
    InvalidFieldPath(String),
    #[error("whole-document upsert needs a JSON object, got {0}")]
    InvalidDocument(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("http request failed: {0}")]
    Http(String),
    #[error("upsert timed out after {0:?}")]
    Timeout(Duration),
    #[error("sink rejected upsert: {0}")]
    Rejected(String),
    #[error("sink is closed")]
    Closed,
}

/// Narrow upsert interface of a document store.
///
/// Documents are keyed by `{userid: user_id}` within a collection. With
/// no `field_path` the document is replaced (keeping `userid`); with a dot
/// path only that nested field is set.
#[async_trait]
pub trait ReplaySink: Send {
    async fn upsert(
        &mut self,
        collection: &str,
        user_id: i32,
        document: &Value,
        field_path: Option<&str>,
    ) -> Result<(), SinkError>;

    /// Flush and release the sink. Further upserts fail with `Closed`.
    async fn close(&mut self) -> Result<(), SinkError>;
}

/// Opens sinks from a URI
#[async_trait]
pub trait SinkConnector: Clone + Send + Sync + 'static {
    type Sink: ReplaySink;

    async fn connect(&self, uri: &str) -> Result<Self::Sink, SinkError>;
}

/// The URI scheme, lowercased
fn scheme(uri: &str) -> Option<String> {
    let (scheme, _) = uri.split_once(':')?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

/// A sink chosen by URI scheme
pub enum UriSink {
    Dir(DirSink),
    Http(HttpSink),
    Memory(MemorySink),
}

impl UriSink {
    /// `file://<dir>`, `http(s)://<base>`, or `memory:`
    pub async fn connect(uri: &str) -> Result<Self, SinkError> {
        Self::connect_with_timeout(uri, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Like [`UriSink::connect`]; network requests give up after `request_timeout`
    pub async fn connect_with_timeout(
        uri: &str,
        request_timeout: Duration,
    ) -> Result<Self, SinkError> {
        let scheme = scheme(uri).ok_or_else(|| SinkError::InvalidUri(uri.to_string()))?;
        match scheme.as_str() {
            "file" => {
                let path = uri[scheme.len()..]
                    .strip_prefix("://")
                    .ok_or_else(|| SinkError::InvalidUri(uri.to_string()))?;
                Ok(Self::Dir(DirSink::open(path).await?))
            }
            "http" | "https" => Ok(Self::Http(HttpSink::with_timeout(uri, request_timeout)?)),
            "memory" => Ok(Self::Memory(MemorySink::new())),
            _ => Err(SinkError::UnsupportedScheme(scheme)),
        }
    }
}

#[async_trait]
impl ReplaySink for UriSink {
    async fn upsert(
        &mut self,
        collection: &str,
        user_id: i32,
        document: &Value,
        field_path: Option<&str>,
    ) -> Result<(), SinkError> {
        match self {
            Self::Dir(s) => s.upsert(collection, user_id, document, field_path).await,
            Self::Http(s) => s.upsert(collection, user_id, document, field_path).await,
            Self::Memory(s) => s.upsert(collection, user_id, document, field_path).await,
        }
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        match self {
            Self::Dir(s) => s.close().await,
            Self::Http(s) => s.close().await,
            Self::Memory(s) => s.close().await,
        }
    }
}

/// Connector for the URI-selected sinks
#[derive(Clone, Copy, Debug)]
pub struct UriConnector {
    request_timeout: Duration,
}

impl Default for UriConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl UriConnector {
    pub fn new() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound each network request of the sinks this connector opens
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[async_trait]
impl SinkConnector for UriConnector {
    type Sink = UriSink;

    async fn connect(&self, uri: &str) -> Result<UriSink, SinkError> {
        UriSink::connect_with_timeout(uri, self.request_timeout).await
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
