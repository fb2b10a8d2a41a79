// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! redo-core: shared types for the redo log archiver and replay tool
//!
//! This crate provides:
//! - The redo record data model (records, changes, briefs)
//! - The versioned binary record codec
//! - Snowflake timestamp helpers and generators
//! - Clock abstraction and configuration loading

pub mod clock;
pub mod codec;
pub mod config;
pub mod id;
pub mod record;
pub mod snowflake;

pub use clock::{Clock, FakeClock, SystemClock};
pub use codec::{decode, decode_brief, encode, CodecError, FORMAT_V1};
pub use config::{ArchiverConfig, ConfigError, ReplayConfig};
pub use id::{SequentialSnowflakeGen, SnowflakeGen, SystemSnowflakeGen};
pub use record::{Brief, Change, RedoRecord};
