// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{apply_upsert, ReplaySink, SinkConnector, SinkError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded sink call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Connect {
        uri: String,
    },
    Upsert {
        collection: String,
        user_id: i32,
        document: Value,
        field_path: Option<String>,
    },
    Close,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<SinkCall>,
    documents: BTreeMap<(String, i32), Value>,
    failing_collections: HashSet<String>,
    refuse_connect: bool,
    delay: Option<Duration>,
}

/// Fake sink that records calls and keeps documents in memory.
///
/// Sinks connected through the same [`FakeConnector`] share state, so a
/// test can inspect what a replay wrote after the engine closed the sink.
#[derive(Clone, Default)]
pub struct FakeSink {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSink {
    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReplaySink for FakeSink {
    async fn upsert(
        &mut self,
        collection: &str,
        user_id: i32,
        document: &Value,
        field_path: Option<&str>,
    ) -> Result<(), SinkError> {
        let delay = {
            let mut state = self.state();
            state.calls.push(SinkCall::Upsert {
                collection: collection.to_string(),
                user_id,
                document: document.clone(),
                field_path: field_path.map(str::to_string),
            });
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.failing_collections.contains(collection) {
            return Err(SinkError::Rejected(format!("collection {collection} is failing")));
        }
        let key = (collection.to_string(), user_id);
        let updated = apply_upsert(state.documents.remove(&key), user_id, document, field_path)?;
        state.documents.insert(key, updated);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.state().calls.push(SinkCall::Close);
        Ok(())
    }
}

/// Connector handing out [`FakeSink`]s with shared state
#[derive(Clone, Default)]
pub struct FakeConnector {
    sink: FakeSink,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SinkCall> {
        self.sink.state().calls.clone()
    }

    /// Recorded upserts only
    pub fn upserts(&self) -> Vec<SinkCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, SinkCall::Upsert { .. }))
            .collect()
    }

    /// Current document for a user in a collection
    pub fn document(&self, collection: &str, user_id: i32) -> Option<Value> {
        self.sink
            .state()
            .documents
            .get(&(collection.to_string(), user_id))
            .cloned()
    }

    /// Make every upsert into `collection` fail
    pub fn fail_collection(&self, collection: &str) {
        self.sink
            .state()
            .failing_collections
            .insert(collection.to_string());
    }

    /// Make `connect` fail
    pub fn refuse_connect(&self) {
        self.sink.state().refuse_connect = true;
    }

    /// Delay every upsert
    pub fn set_delay(&self, delay: Duration) {
        self.sink.state().delay = Some(delay);
    }
}

#[async_trait]
impl SinkConnector for FakeConnector {
    type Sink = FakeSink;

    async fn connect(&self, uri: &str) -> Result<FakeSink, SinkError> {
        let mut state = self.sink.state();
        state.calls.push(SinkCall::Connect {
            uri: uri.to_string(),
        });
        if state.refuse_connect {
            return Err(SinkError::Rejected(format!("refused connection to {uri}")));
        }
        Ok(self.sink.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
