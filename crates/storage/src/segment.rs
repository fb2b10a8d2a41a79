// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only segment files

use chrono::{DateTime, NaiveDateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use redo_core::CodecError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// The single table of every segment.
/// Key: 8-byte big-endian sequence number, Value: encoded record.
pub const REDOLOG: TableDefinition<&[u8], &[u8]> = TableDefinition::new("REDOLOG");

const NAME_PREFIX: &str = "REDO-";
const NAME_SUFFIX: &str = ".RDO";
const INSTANT_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors that can occur in segment operations
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("invalid segment name: {0}")]
    InvalidName(String),
    #[error("invalid key length {0} (expected 8 bytes)")]
    InvalidKey(usize),
    #[error("timed out after {1:?} waiting for {0}")]
    Timeout(PathBuf, Duration),
    #[error("record {key}: {source}")]
    Corrupt {
        key: u64,
        #[source]
        source: CodecError,
    },
}

/// Segment identity: its creation instant, at millisecond precision.
///
/// File names look like `REDO-2020-01-02T15:04:05.123.RDO`. Names without
/// the millisecond part are accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentName {
    created_at: DateTime<Utc>,
}

impl SegmentName {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        let millis = created_at.timestamp_millis();
        let created_at = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(created_at);
        Self { created_at }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}{}.{:03}{}",
            NAME_PREFIX,
            self.created_at.format(INSTANT_LAYOUT),
            self.created_at.timestamp_subsec_millis(),
            NAME_SUFFIX
        )
    }

    /// Parse a segment file name
    pub fn parse(file_name: &str) -> Result<Self, SegmentError> {
        let invalid = || SegmentError::InvalidName(file_name.to_string());

        let stem = file_name
            .strip_prefix(NAME_PREFIX)
            .and_then(|s| s.strip_suffix(NAME_SUFFIX))
            .ok_or_else(invalid)?;

        let (base, millis) = match stem.split_once('.') {
            Some((base, millis)) => {
                if millis.len() != 3 || !millis.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                (base, millis.parse::<i64>().map_err(|_| invalid())?)
            }
            None => (stem, 0),
        };

        let naive = NaiveDateTime::parse_from_str(base, INSTANT_LAYOUT).map_err(|_| invalid())?;
        Ok(Self {
            created_at: naive.and_utc() + chrono::Duration::milliseconds(millis),
        })
    }

    /// Name for a segment created at `instant` that must follow `self`.
    ///
    /// Two rotations inside the same millisecond would collide on disk, so
    /// the instant is bumped past the current name.
    pub fn successor(&self, instant: DateTime<Utc>) -> Self {
        let candidate = Self::new(instant);
        if candidate > *self {
            candidate
        } else {
            Self::new(self.created_at + chrono::Duration::milliseconds(1))
        }
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Encode a sequence number as a segment key
pub fn encode_key(sequence: u64) -> [u8; 8] {
    sequence.to_be_bytes()
}

/// Decode a segment key into its sequence number
pub fn decode_key(key: &[u8]) -> Result<u64, SegmentError> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| SegmentError::InvalidKey(key.len()))?;
    Ok(u64::from_be_bytes(bytes))
}

/// The writable segment.
///
/// Owned by exactly one writer; every append is its own committed
/// transaction and returns the assigned key only after the commit.
pub struct SegmentStore {
    db: Database,
    name: SegmentName,
    path: PathBuf,
    next_sequence: u64,
}

impl SegmentStore {
    /// Open or create the segment `name` inside `dir`.
    ///
    /// Reopening an existing file continues after its last key, so keys
    /// are never reused.
    pub fn create(dir: &Path, name: SegmentName) -> Result<Self, SegmentError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name.file_name());
        let db = Database::create(&path)?;

        let write_txn = db.begin_write()?;
        let last = {
            let table = write_txn.open_table(REDOLOG)?;
            let last = table.last()?;
            last.map(|(key, _)| decode_key(key.value())).transpose()?
        };
        write_txn.commit()?;

        let next_sequence = last.unwrap_or(0) + 1;
        info!(segment = %name, next_sequence, "opened segment");

        Ok(Self {
            db,
            name,
            path,
            next_sequence,
        })
    }

    /// Append an encoded record, returning its key once committed
    pub fn append(&mut self, record: &[u8]) -> Result<u64, SegmentError> {
        let sequence = self.next_sequence;
        let key = encode_key(sequence);

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(REDOLOG)?;
            table.insert(&key[..], record)?;
        }
        write_txn.commit()?;

        self.next_sequence += 1;
        Ok(sequence)
    }

    /// Read back a committed record
    pub fn get(&self, sequence: u64) -> Result<Option<Vec<u8>>, SegmentError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REDOLOG)?;
        let key = encode_key(sequence);
        let value = table.get(&key[..])?.map(|v| v.value().to_vec());
        Ok(value)
    }

    pub fn name(&self) -> SegmentName {
        self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key of the last committed record, 0 when empty
    pub fn last_key(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Close the segment; it becomes read-only from here on
    pub fn close(self) {
        let Self { db, name, .. } = self;
        drop(db);
        info!(segment = %name, "closed segment");
    }
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
