// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced sink wrappers for consistent observability

use crate::sink::{ReplaySink, SinkConnector, SinkError};
use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;

/// Wrapper that adds tracing to any ReplaySink
pub struct TracedSink<S> {
    inner: S,
    uri: String,
}

impl<S> TracedSink<S> {
    pub fn new(inner: S, uri: impl Into<String>) -> Self {
        Self {
            inner,
            uri: uri.into(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ReplaySink> ReplaySink for TracedSink<S> {
    async fn upsert(
        &mut self,
        collection: &str,
        user_id: i32,
        document: &Value,
        field_path: Option<&str>,
    ) -> Result<(), SinkError> {
        let span = tracing::info_span!(
            "sink.upsert",
            uri = %self.uri,
            collection,
            user_id,
            field = field_path.unwrap_or("")
        );

        let start = std::time::Instant::now();
        let result = self
            .inner
            .upsert(collection, user_id, document, field_path)
            .instrument(span.clone())
            .await;
        let elapsed = start.elapsed();

        span.in_scope(|| match &result {
            Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "upserted"),
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "upsert failed"
            ),
        });

        result
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        let result = self.inner.close().await;
        match &result {
            Ok(()) => tracing::info!(uri = %self.uri, "sink closed"),
            Err(e) => tracing::warn!(uri = %self.uri, error = %e, "sink close failed"),
        }
        result
    }
}

/// Wrapper that adds tracing to any SinkConnector
#[derive(Clone)]
pub struct TracedConnector<C> {
    inner: C,
}

impl<C> TracedConnector<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: SinkConnector> SinkConnector for TracedConnector<C> {
    type Sink = TracedSink<C::Sink>;

    async fn connect(&self, uri: &str) -> Result<Self::Sink, SinkError> {
        let span = tracing::info_span!("sink.connect", uri);
        let result = self.inner.connect(uri).instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(_) => tracing::info!("connected"),
            Err(e) => tracing::error!(error = %e, "connect failed"),
        });

        result.map(|sink| TracedSink::new(sink, uri))
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
