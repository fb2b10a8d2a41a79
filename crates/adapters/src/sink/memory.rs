// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process sink for dry runs; contents are discarded on close

use super::{apply_upsert, ReplaySink, SinkError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemorySink {
    collections: BTreeMap<String, BTreeMap<i32, Value>>,
    upserts: usize,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, collection: &str, user_id: i32) -> Option<&Value> {
        self.collections.get(collection)?.get(&user_id)
    }

    /// Number of successful upserts
    pub fn upserts(&self) -> usize {
        self.upserts
    }
}

#[async_trait]
impl ReplaySink for MemorySink {
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
        let documents = self.collections.entry(collection.to_string()).or_default();
        let updated = apply_upsert(documents.get(&user_id).cloned(), user_id, document, field_path)?;
        documents.insert(user_id, updated);
        self.upserts += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        self.collections.clear();
        Ok(())
    }
}
