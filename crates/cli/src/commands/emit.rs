// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `redo emit` - send a record to the archiver

use crate::client::ArchiverClient;
use anyhow::{bail, Context, Result};
use clap::Args;
use redo_archiver::protocol::Ack;
use redo_core::{
    encode, ArchiverConfig, Change, RedoRecord, SnowflakeGen, SystemClock, SystemSnowflakeGen,
};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct EmitArgs {
    /// Archiver socket (defaults to the configured socket)
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Owning user id
    #[arg(long, required_unless_present = "file")]
    pub user: Option<i32>,

    /// Api name that produced the record
    #[arg(long, required_unless_present = "file")]
    pub api: Option<String>,

    /// Snowflake timestamp (defaults to now)
    #[arg(long)]
    pub timestamp: Option<u64>,

    /// Change as `collection:field:json`; an empty field replaces the document
    #[arg(long = "change", value_parser = parse_change)]
    pub changes: Vec<Change>,

    /// Read the record from a JSON file instead
    #[arg(long, conflicts_with_all = ["user", "api", "timestamp", "changes"])]
    pub file: Option<PathBuf>,
}

/// Record layout accepted by `--file`
#[derive(Debug, Deserialize)]
struct RecordFile {
    user_id: i32,
    api: String,
    #[serde(default)]
    timestamp: Option<u64>,
    #[serde(default)]
    changes: Vec<ChangeFile>,
}

#[derive(Debug, Deserialize)]
struct ChangeFile {
    collection: String,
    #[serde(default)]
    field: String,
    document: serde_json::Value,
}

pub async fn handle(args: EmitArgs) -> Result<()> {
    let socket = match args.socket.clone() {
        Some(socket) => socket,
        None => ArchiverConfig::load(None)?.socket_path(),
    };
    let record = build_record(args, || SystemSnowflakeGen::new(SystemClock).next())?;
    let payload = encode(&record)?;

    let mut client = ArchiverClient::connect(&socket).await?;
    match client.submit(&payload).await? {
        Ack::Committed { segment, key } => {
            println!("committed segment={segment} key={key}");
            Ok(())
        }
        Ack::Dropped { reason } => bail!("record dropped: {reason}"),
        Ack::Closed => bail!("archiver is shutting down"),
    }
}

/// Assemble the record from flags or `--file`; `now` supplies a missing timestamp
fn build_record(args: EmitArgs, now: impl FnOnce() -> u64) -> Result<RedoRecord> {
    if let Some(path) = args.file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file: RecordFile = serde_json::from_str(&content)
            .with_context(|| format!("invalid record in {}", path.display()))?;
        let record = RedoRecord::new(file.api, file.user_id, file.timestamp.unwrap_or_else(now));
        return Ok(file.changes.into_iter().fold(record, |record, change| {
            record.with_change(Change::with_document(
                change.collection,
                change.field,
                &change.document,
            ))
        }));
    }

    let (Some(user), Some(api)) = (args.user, args.api) else {
        bail!("--user and --api are required without --file");
    };
    let timestamp = args.timestamp.unwrap_or_else(now);
    Ok(args
        .changes
        .into_iter()
        .fold(RedoRecord::new(api, user, timestamp), RedoRecord::with_change))
}

/// Parse `collection:field:json`
fn parse_change(s: &str) -> Result<Change, String> {
    let mut parts = s.splitn(3, ':');
    let (Some(collection), Some(field), Some(json)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected collection:field:json, got '{s}'"));
    };
    if collection.is_empty() {
        return Err("collection must not be empty".to_string());
    }
    let document: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("invalid JSON document: {e}"))?;
    Ok(Change::with_document(collection, field, &document))
}

#[cfg(test)]
#[path = "emit_tests.rs"]
mod tests;
