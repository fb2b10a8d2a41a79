// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snowflake timestamp generation
//!
//! Production records get their timestamps upstream; these generators
//! exist for producers in this workspace (the `emit` command and tests).

use crate::clock::Clock;
use crate::snowflake;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Generates snowflake timestamps
pub trait SnowflakeGen: Clone + Send + Sync {
    fn next(&self) -> u64;
}

/// Clock-backed generator: current epoch milliseconds plus a sequence
/// that restarts every millisecond.
#[derive(Clone)]
pub struct SystemSnowflakeGen<C: Clock> {
    clock: C,
    last: Arc<Mutex<(u64, u64)>>,
}

impl<C: Clock> SystemSnowflakeGen<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last: Arc::new(Mutex::new((0, 0))),
        }
    }
}

impl<C: Clock> SnowflakeGen for SystemSnowflakeGen<C> {
    fn next(&self) -> u64 {
        let now_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let (last_ms, sequence) = *last;
        // Never go backwards, even if the clock does
        let next = if now_ms > last_ms {
            (now_ms, 0)
        } else if sequence < snowflake::SEQUENCE_MASK {
            (last_ms, sequence + 1)
        } else {
            (last_ms + 1, 0)
        };
        *last = next;
        snowflake::compose(next.0, next.1)
    }
}

/// Sequential generator for testing: fixed millisecond, increasing sequence
#[derive(Clone)]
pub struct SequentialSnowflakeGen {
    millis: u64,
    counter: Arc<AtomicU64>,
}

impl SequentialSnowflakeGen {
    pub fn new(millis: u64) -> Self {
        Self {
            millis,
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl SnowflakeGen for SequentialSnowflakeGen {
    fn next(&self) -> u64 {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        snowflake::compose(self.millis, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
