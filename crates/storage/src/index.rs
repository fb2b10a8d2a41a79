// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory brief index built from a one-time segment scan

use crate::segment::SegmentError;
use crate::set::{Segment, SegmentSet};
use redo_core::{codec, snowflake};
use tracing::{info, warn};

/// One stored record, located by segment position and key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Position of the segment in its [`SegmentSet`]
    pub segment: usize,
    pub key: u64,
    pub user_id: i32,
    pub timestamp: u64,
}

impl IndexEntry {
    /// Epoch milliseconds of the record's snowflake timestamp
    pub fn millis(&self) -> i64 {
        snowflake::millis(self.timestamp)
    }
}

/// Entries ordered by (segment, key), which is chronological order
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
    skipped_records: usize,
    skipped_segments: usize,
}

impl Index {
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Entry at a 1-based position
    pub fn position(&self, position: usize) -> Option<&IndexEntry> {
        position
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records whose brief could not be decoded
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// Segments whose scan failed
    pub fn skipped_segments(&self) -> usize {
        self.skipped_segments
    }
}

/// Result of scanning one segment
#[derive(Debug, Default)]
pub struct SegmentScan {
    pub entries: Vec<IndexEntry>,
    pub skipped: usize,
}

/// Builds the brief index
pub struct Indexer;

impl Indexer {
    /// Scan every segment, concurrently, and join the results in segment
    /// order. Failing segments are logged and left out.
    pub async fn build(set: &SegmentSet) -> Index {
        let handles: Vec<_> = set
            .segments()
            .iter()
            .cloned()
            .enumerate()
            .map(|(position, segment)| {
                tokio::task::spawn_blocking(move || Self::scan(position, &segment))
            })
            .collect();

        let mut index = Index::default();
        for (position, handle) in handles.into_iter().enumerate() {
            let segment = set.get(position).map(|s| s.name().to_string());
            match handle.await {
                Ok(Ok(scan)) => {
                    index.entries.extend(scan.entries);
                    index.skipped_records += scan.skipped;
                }
                Ok(Err(e)) => {
                    warn!(segment = ?segment, error = %e, "segment scan failed, skipping");
                    index.skipped_segments += 1;
                }
                Err(e) => {
                    warn!(segment = ?segment, error = %e, "segment scan aborted, skipping");
                    index.skipped_segments += 1;
                }
            }
        }

        info!(
            records = index.entries.len(),
            segments = set.len(),
            skipped_records = index.skipped_records,
            skipped_segments = index.skipped_segments,
            "index built"
        );
        index
    }

    /// Forward-scan one segment decoding only briefs
    pub fn scan(position: usize, segment: &Segment) -> Result<SegmentScan, SegmentError> {
        let mut scan = SegmentScan::default();
        segment.for_each(|key, bytes| match codec::decode_brief(bytes) {
            Ok(brief) => scan.entries.push(IndexEntry {
                segment: position,
                key,
                user_id: brief.user_id,
                timestamp: brief.timestamp,
            }),
            Err(e) => {
                warn!(segment = %segment.name(), key, error = %e, "corrupt record, skipping");
                scan.skipped += 1;
            }
        })?;
        Ok(scan)
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
