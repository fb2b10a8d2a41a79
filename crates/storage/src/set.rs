// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed segments opened for replay

use crate::segment::{decode_key, encode_key, SegmentError, SegmentName, REDOLOG};
use redb::{Database, DatabaseError, ReadTransaction, ReadableTable, TableError};
use redo_core::{codec, RedoRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long to wait for a segment still held by a writer
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(2);

const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// A closed segment opened for reading
#[derive(Clone)]
pub struct Segment {
    name: SegmentName,
    path: PathBuf,
    db: Arc<Database>,
}

/// Record counts of one segment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentStats {
    pub records: usize,
    pub corrupt: usize,
    /// Records per user id
    pub users: BTreeMap<i32, usize>,
}

impl Segment {
    /// Open a segment, retrying while another handle holds it
    pub fn open(path: &Path, timeout: Duration) -> Result<Self, SegmentError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SegmentError::InvalidName(path.display().to_string()))?;
        let name = SegmentName::parse(file_name)?;

        let deadline = Instant::now() + timeout;
        let db = loop {
            match Database::open(path) {
                Ok(db) => break db,
                Err(DatabaseError::DatabaseAlreadyOpen) if Instant::now() < deadline => {
                    debug!(path = %path.display(), "segment busy, retrying");
                    std::thread::sleep(OPEN_RETRY_INTERVAL);
                }
                Err(DatabaseError::DatabaseAlreadyOpen) => {
                    return Err(SegmentError::Timeout(path.to_path_buf(), timeout));
                }
                Err(e) => return Err(e.into()),
            }
        };

        Ok(Self {
            name,
            path: path.to_path_buf(),
            db: Arc::new(db),
        })
    }

    pub fn name(&self) -> SegmentName {
        self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch and decode a full record
    pub fn get(&self, key: u64) -> Result<Option<RedoRecord>, SegmentError> {
        let Some(bytes) = self.get_raw(key)? else {
            return Ok(None);
        };
        codec::decode(&bytes)
            .map(Some)
            .map_err(|source| SegmentError::Corrupt { key, source })
    }

    /// Fetch a record's stored bytes
    pub fn get_raw(&self, key: u64) -> Result<Option<Vec<u8>>, SegmentError> {
        let read_txn = self.db.begin_read()?;
        let Some(table) = open_table(&read_txn)? else {
            return Ok(None);
        };
        let key = encode_key(key);
        let value = table.get(&key[..])?.map(|v| v.value().to_vec());
        Ok(value)
    }

    /// Visit every `(key, bytes)` pair in key order
    pub fn for_each<F>(&self, mut visit: F) -> Result<(), SegmentError>
    where
        F: FnMut(u64, &[u8]),
    {
        let read_txn = self.db.begin_read()?;
        let Some(table) = open_table(&read_txn)? else {
            return Ok(());
        };
        for entry in table.iter()? {
            let (key, value) = entry?;
            visit(decode_key(key.value())?, value.value());
        }
        Ok(())
    }

    /// Count records, per user, decoding only briefs
    pub fn stats(&self) -> Result<SegmentStats, SegmentError> {
        let mut stats = SegmentStats::default();
        self.for_each(|key, bytes| match codec::decode_brief(bytes) {
            Ok(brief) => {
                stats.records += 1;
                *stats.users.entry(brief.user_id).or_default() += 1;
            }
            Err(e) => {
                warn!(segment = %self.name, key, error = %e, "corrupt record");
                stats.corrupt += 1;
            }
        })?;
        Ok(stats)
    }
}

/// A segment whose table was never created holds no records
fn open_table(
    read_txn: &ReadTransaction,
) -> Result<Option<redb::ReadOnlyTable<&'static [u8], &'static [u8]>>, SegmentError> {
    match read_txn.open_table(REDOLOG) {
        Ok(table) => Ok(Some(table)),
        Err(TableError::TableDoesNotExist(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Segments of a data directory, ascending by creation instant
pub struct SegmentSet {
    dir: PathBuf,
    segments: Vec<Segment>,
}

impl SegmentSet {
    /// List segment files in `dir`, sorted by the instant in their name.
    ///
    /// Files that look like segments but carry an unparseable name are
    /// skipped with a warning.
    pub fn discover(dir: &Path) -> Result<Vec<(SegmentName, PathBuf)>, SegmentError> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("RDO") {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match SegmentName::parse(file_name) {
                Ok(name) => found.push((name, path)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping segment"),
            }
        }
        found.sort();
        Ok(found)
    }

    /// Open every segment in `dir`.
    ///
    /// A segment that cannot be opened within `timeout` (typically the one
    /// the archiver is still writing) is skipped with a warning.
    pub fn open(dir: &Path, timeout: Duration) -> Result<Self, SegmentError> {
        let mut segments = Vec::new();
        for (_, path) in Self::discover(dir)? {
            match Segment::open(&path, timeout) {
                Ok(segment) => segments.push(segment),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping segment"),
            }
        }
        debug!(dir = %dir.display(), count = segments.len(), "opened segments");
        Ok(Self {
            dir: dir.to_path_buf(),
            segments,
        })
    }

    /// [`SegmentSet::open`] on the blocking pool, so busy-segment retries
    /// never stall the async runtime
    pub async fn open_blocking(dir: &Path, timeout: Duration) -> Result<Self, SegmentError> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || Self::open(&dir, timeout))
            .await
            .map_err(std::io::Error::other)?
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Fetch a full record by segment position and key
    pub fn record(&self, segment: usize, key: u64) -> Result<Option<RedoRecord>, SegmentError> {
        match self.segments.get(segment) {
            Some(s) => s.get(key),
            None => Ok(None),
        }
    }

    /// Record counts of the segment at `segment`
    pub fn stats(&self, segment: usize) -> Result<Option<SegmentStats>, SegmentError> {
        self.segments.get(segment).map(Segment::stats).transpose()
    }
}

#[cfg(test)]
#[path = "set_tests.rs"]
mod tests;
