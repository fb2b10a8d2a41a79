// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Query and replay engine over archived redo segments

pub mod command;
mod engine;
pub mod lexer;
pub mod replay;
pub mod session;

pub use command::{parse, Command, ParseError, HELP};
pub use engine::{EngineError, QueryEngine, DEFAULT_SINK_TIMEOUT};
pub use replay::ReplaySummary;
pub use session::{Session, Window};
