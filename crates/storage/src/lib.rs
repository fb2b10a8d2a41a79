// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Segment storage for the redo log
//!
//! Each rotation period is one redb file holding `{sequence key → record}`
//! pairs. The archiver appends to exactly one writable [`SegmentStore`];
//! the replay tool opens closed segments as a [`SegmentSet`] and builds an
//! in-memory [`Index`] of record briefs.

mod index;
mod segment;
mod set;

pub use index::{Index, IndexEntry, Indexer, SegmentScan};
pub use segment::{decode_key, encode_key, SegmentError, SegmentName, SegmentStore, REDOLOG};
pub use set::{Segment, SegmentSet, SegmentStats, DEFAULT_OPEN_TIMEOUT};
