// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Replay sinks: where replayed changes are written

pub mod sink;
pub mod traced;

pub use sink::{
    apply_upsert, DirSink, HttpSink, MemorySink, ReplaySink, SinkConnector, SinkError,
    UriConnector, UriSink, DEFAULT_REQUEST_TIMEOUT,
};
pub use traced::{TracedConnector, TracedSink};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use sink::{FakeConnector, FakeSink, SinkCall};
