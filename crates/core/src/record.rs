// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redo record data model

use crate::codec::{self, CodecError};
use crate::snowflake;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single field- or whole-document-level mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Target collection
    pub collection: String,
    /// Dot path inside the document ("a.b.c"); empty means the whole document
    pub field: String,
    /// Serialized document (UTF-8 JSON)
    pub payload: Vec<u8>,
}

impl Change {
    pub fn new(collection: impl Into<String>, field: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            payload,
        }
    }

    /// Build a change carrying a JSON document
    pub fn with_document(
        collection: impl Into<String>,
        field: impl Into<String>,
        document: &serde_json::Value,
    ) -> Self {
        Self::new(collection, field, document.to_string().into_bytes())
    }

    /// Whether this change replaces the whole document
    pub fn is_whole_document(&self) -> bool {
        self.field.is_empty()
    }

    /// Field path for a partial update, `None` for whole-document changes
    pub fn field_path(&self) -> Option<&str> {
        if self.field.is_empty() {
            None
        } else {
            Some(&self.field)
        }
    }

    /// Decode the payload into a document
    pub fn document(&self) -> Result<serde_json::Value, CodecError> {
        codec::decode_document(&self.payload)
    }
}

/// A redo record: one upstream transaction and its ordered changes.
///
/// Field order matters: the codec relies on `user_id` and `timestamp`
/// leading the encoding so that [`Brief`] can be decoded from a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedoRecord {
    pub user_id: i32,
    /// Snowflake id; `timestamp >> 22` is epoch milliseconds
    pub timestamp: u64,
    /// The api name that produced the record
    pub api: String,
    pub changes: Vec<Change>,
}

impl RedoRecord {
    pub fn new(api: impl Into<String>, user_id: i32, timestamp: u64) -> Self {
        Self {
            user_id,
            timestamp,
            api: api.into(),
            changes: Vec::new(),
        }
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    /// Creation instant decoded from the snowflake timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        snowflake::to_datetime(self.timestamp)
    }

    pub fn brief(&self) -> Brief {
        Brief {
            user_id: self.user_id,
            timestamp: self.timestamp,
        }
    }
}

/// Lightweight {user, timestamp} projection used for indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    pub user_id: i32,
    pub timestamp: u64,
}

impl Brief {
    /// Epoch milliseconds encoded in the timestamp
    pub fn millis(&self) -> i64 {
        snowflake::millis(self.timestamp)
    }
}
