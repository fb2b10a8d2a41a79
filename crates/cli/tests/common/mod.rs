// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use redo_core::{encode, snowflake, Change, RedoRecord};
use redo_storage::{SegmentName, SegmentStore};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

/// 2020-01-01T00:00:00Z in epoch milliseconds
pub const JAN_1: u64 = 1_577_836_800_000;
pub const HOUR: u64 = 3_600_000;

pub fn ts(millis: u64, sequence: u64) -> u64 {
    snowflake::compose(millis, sequence)
}

/// Write one segment named after midnight of `day` in January 2020
pub fn write_segment(dir: &Path, day: u32, records: &[RedoRecord]) {
    let name = SegmentName::new(Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap());
    let mut store = SegmentStore::create(dir, name).unwrap();
    for record in records {
        store.append(&encode(record).unwrap()).unwrap();
    }
    store.close();
}

/// Data directory with two segments:
/// Jan 1 holds users 1 and 2, Jan 2 holds user 1 again.
pub fn setup_archive() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    write_segment(
        temp.path(),
        1,
        &[
            RedoRecord::new("login", 1, ts(JAN_1, 1)).with_change(Change::with_document(
                "players",
                "",
                &json!({"name": "ann", "stats": {"hp": 10}}),
            )),
            RedoRecord::new("move", 2, ts(JAN_1 + HOUR, 2)).with_change(Change::with_document(
                "players",
                "stats.hp",
                &json!(5),
            )),
        ],
    );
    write_segment(
        temp.path(),
        2,
        &[RedoRecord::new("move", 1, ts(JAN_1 + 24 * HOUR + 1, 3)).with_change(
            Change::with_document("players", "stats.hp", &json!(42)),
        )],
    );
    temp
}
