// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snowflake timestamp layout
//!
//! Upstream ids carry epoch milliseconds in the high bits and a 22-bit
//! sequence/shard in the low bits. The layout is defined by the upstream
//! id generator and must not change here.

use chrono::{DateTime, Utc};

/// Number of low bits holding the intra-millisecond sequence/shard
pub const SEQUENCE_BITS: u32 = 22;

/// Mask for the low sequence bits
pub const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Epoch milliseconds encoded in a snowflake timestamp
pub fn millis(timestamp: u64) -> i64 {
    (timestamp >> SEQUENCE_BITS) as i64
}

/// Creation instant encoded in a snowflake timestamp
pub fn to_datetime(timestamp: u64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis(timestamp))
}

/// Compose a snowflake timestamp from epoch milliseconds and a sequence
pub fn compose(millis: u64, sequence: u64) -> u64 {
    (millis << SEQUENCE_BITS) | (sequence & SEQUENCE_MASK)
}
