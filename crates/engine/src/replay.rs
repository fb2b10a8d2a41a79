// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort application of stored records to a sink

use redo_adapters::{ReplaySink, SinkError};
use redo_core::RedoRecord;
use redo_storage::{IndexEntry, SegmentSet};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Outcome counts of one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Records with every change applied
    pub records: usize,
    /// Records that could not be read or had a failed change
    pub failed_records: usize,
    pub changes: usize,
    pub failed_changes: usize,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "replayed records:{} failed_records:{} changes:{} failed_changes:{}",
            self.records, self.failed_records, self.changes, self.failed_changes
        )
    }
}

/// Apply every change of a record, in order.
///
/// Returns `(applied, failed)` change counts. A failed change is logged and
/// the remaining changes are still applied.
pub async fn apply_record<S: ReplaySink>(
    sink: &mut S,
    record: &RedoRecord,
    timeout: Duration,
) -> (usize, usize) {
    let mut applied = 0;
    let mut failed = 0;
    for (i, change) in record.changes.iter().enumerate() {
        let document = match change.document() {
            Ok(document) => document,
            Err(e) => {
                warn!(user_id = record.user_id, change = i, error = %e, "undecodable change");
                failed += 1;
                continue;
            }
        };

        let upsert = sink.upsert(
            &change.collection,
            record.user_id,
            &document,
            change.field_path(),
        );
        let result = match tokio::time::timeout(timeout, upsert).await {
            Ok(result) => result,
            Err(_) => Err(SinkError::Timeout(timeout)),
        };
        match result {
            Ok(()) => applied += 1,
            Err(e) => {
                warn!(
                    user_id = record.user_id,
                    change = i,
                    collection = %change.collection,
                    field = %change.field,
                    error = %e,
                    "change not applied"
                );
                failed += 1;
            }
        }
    }
    (applied, failed)
}

/// Replay the records behind `entries`, in order
pub async fn replay<'a, S, I>(
    sink: &mut S,
    set: &SegmentSet,
    entries: I,
    timeout: Duration,
) -> ReplaySummary
where
    S: ReplaySink,
    I: IntoIterator<Item = &'a IndexEntry>,
{
    let mut summary = ReplaySummary::default();
    for entry in entries {
        let record = match set.record(entry.segment, entry.key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(segment = entry.segment, key = entry.key, "record vanished");
                summary.failed_records += 1;
                continue;
            }
            Err(e) => {
                warn!(segment = entry.segment, key = entry.key, error = %e, "record unreadable");
                summary.failed_records += 1;
                continue;
            }
        };

        let (applied, failed) = apply_record(sink, &record, timeout).await;
        summary.changes += applied;
        summary.failed_changes += failed;
        if failed == 0 {
            summary.records += 1;
        } else {
            summary.failed_records += 1;
        }
    }
    summary
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
