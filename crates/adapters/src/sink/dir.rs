// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON document directory sink.
//!
//! Each collection is one `<collection>.json` file holding an object keyed
//! by user id. Every upsert rewrites the collection file through a
//! temporary file and a rename.

use super::{apply_upsert, ReplaySink, SinkError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct DirSink {
    root: PathBuf,
    collections: HashMap<String, Map<String, Value>>,
    closed: bool,
}

impl DirSink {
    /// Open (creating if needed) the directory at `path`
    pub async fn open(path: &str) -> Result<Self, SinkError> {
        if path.is_empty() || !Path::new(path).is_absolute() {
            return Err(SinkError::InvalidUri(format!("file://{path}")));
        }
        let root = PathBuf::from(path);
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            collections: HashMap::new(),
            closed: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a collection's file
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    async fn load(&mut self, collection: &str) -> Result<&mut Map<String, Value>, SinkError> {
        if !self.collections.contains_key(collection) {
            let path = self.collection_path(collection);
            let documents = match tokio::fs::read(&path).await {
                Ok(bytes) => serde_json::from_slice(&bytes)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
                Err(e) => return Err(e.into()),
            };
            self.collections.insert(collection.to_string(), documents);
        }
        self.collections
            .get_mut(collection)
            .ok_or_else(|| SinkError::InvalidCollection(collection.to_string()))
    }

    async fn store(&self, collection: &str) -> Result<(), SinkError> {
        let Some(documents) = self.collections.get(collection) else {
            return Ok(());
        };
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(documents)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Collection names become file names
fn validate_collection(collection: &str) -> Result<(), SinkError> {
    let valid = !collection.is_empty()
        && !collection.starts_with('.')
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SinkError::InvalidCollection(collection.to_string()))
    }
}

#[async_trait]
impl ReplaySink for DirSink {
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
        validate_collection(collection)?;

        let documents = self.load(collection).await?;
        let key = user_id.to_string();
        let updated = apply_upsert(documents.remove(&key), user_id, document, field_path);
        match updated {
            Ok(doc) => {
                documents.insert(key, doc);
            }
            Err(e) => {
                // Reload from disk on the next upsert rather than keep a
                // collection missing this document.
                self.collections.remove(collection);
                return Err(e);
            }
        }
        self.store(collection).await
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        self.collections.clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "dir_tests.rs"]
mod tests;
