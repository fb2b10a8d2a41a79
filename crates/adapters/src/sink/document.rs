// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upsert semantics shared by the local sinks

use super::SinkError;
use serde_json::{Map, Value};

const USER_KEY: &str = "userid";

/// Apply one upsert to the stored document for `user_id`.
///
/// A missing document starts as `{"userid": user_id}`. Without a field
/// path (or with an empty one) `document` replaces the stored document and
/// `userid` is restored. With a dot path, intermediate objects are created
/// as needed and the leaf is overwritten.
pub fn apply_upsert(
    existing: Option<Value>,
    user_id: i32,
    document: &Value,
    field_path: Option<&str>,
) -> Result<Value, SinkError> {
    let mut stored = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    match field_path.filter(|p| !p.is_empty()) {
        None => {
            let Value::Object(replacement) = document else {
                return Err(SinkError::InvalidDocument(kind(document).to_string()));
            };
            stored = replacement.clone();
        }
        Some(path) => set_path(&mut stored, path, document.clone())?,
    }

    stored.insert(USER_KEY.to_string(), Value::from(user_id));
    Ok(Value::Object(stored))
}

fn set_path(root: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), SinkError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(SinkError::InvalidFieldPath(path.to_string()));
    }
    let Some((leaf, parents)) = parts.split_last() else {
        return Err(SinkError::InvalidFieldPath(path.to_string()));
    };

    let mut node = root;
    for part in parents {
        let slot = node
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        node = match slot {
            Value::Object(map) => map,
            _ => return Err(SinkError::InvalidFieldPath(path.to_string())),
        };
    }
    node.insert(leaf.to_string(), value);
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
