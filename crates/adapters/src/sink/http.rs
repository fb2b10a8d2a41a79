// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP document service sink

use super::{ReplaySink, SinkError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

/// Default bound for one request, connect to response
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// POSTs each upsert as JSON to `<base>/upsert`.
///
/// The request body is
/// `{"collection": c, "userid": id, "field": path-or-null, "document": doc}`.
/// Requests run on the blocking pool, one at a time: a request abandoned
/// by its caller still finishes before the next one is sent.
pub struct HttpSink {
    endpoint: String,
    agent: ureq::Agent,
    in_flight: Option<JoinHandle<Result<(), SinkError>>>,
    closed: bool,
}

impl HttpSink {
    pub fn new(base: &str) -> Result<Self, SinkError> {
        Self::with_timeout(base, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Sink whose requests each give up after `timeout`
    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self, SinkError> {
        let base = base.trim_end_matches('/');
        let authority = base
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        if authority.is_empty() {
            return Err(SinkError::InvalidUri(base.to_string()));
        }
        Ok(Self {
            endpoint: format!("{base}/upsert"),
            agent: ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .build()
                .into(),
            in_flight: None,
            closed: false,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Wait out a request whose caller gave up on it
    async fn settle(&mut self) {
        // Cleared only once finished; dropping this future leaves it in place
        if let Some(task) = self.in_flight.as_mut() {
            let result = task.await;
            self.in_flight = None;
            if let Ok(Err(e)) = result {
                warn!(endpoint = %self.endpoint, error = %e, "abandoned request failed");
            }
        }
    }
}

/// JSON body of one upsert request
pub(crate) fn request_body(
    collection: &str,
    user_id: i32,
    document: &Value,
    field_path: Option<&str>,
) -> Value {
    json!({
        "collection": collection,
        "userid": user_id,
        "field": field_path.filter(|p| !p.is_empty()),
        "document": document,
    })
}

#[async_trait]
impl ReplaySink for HttpSink {
    async fn upsert(
        &mut self,
        collection: &str,
        user_id: i32,
        document: &Value,
        field_path: Option<&str>,
    ) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.settle().await;

        let body = serde_json::to_string(&request_body(collection, user_id, document, field_path))?;
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();

        // Kept in `self` so a caller that stops waiting leaves it to `settle`
        let task = self.in_flight.insert(tokio::task::spawn_blocking(move || {
            agent
                .post(&endpoint)
                .header("content-type", "application/json")
                .send(body)
                .map(|_| ())
                .map_err(|e| SinkError::Http(e.to_string()))
        }));
        let result = task.await;
        self.in_flight = None;
        result.map_err(|e| SinkError::Http(format!("request task failed: {e}")))?
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.settle().await;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
