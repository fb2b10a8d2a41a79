// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! redo-archiver: the redo log archiver daemon
//!
//! Producers connect over a Unix socket and send length-prefixed redo
//! records. A single writer task appends them to the current segment and
//! rotates segments on a timer or on request.

pub mod archiver;
pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use archiver::{Archiver, ArchiverError, ArchiverHandle, ArchiverState};
pub use lifecycle::{DaemonState, LifecycleError};
pub use protocol::{read_message, write_message, Ack, ProtocolError, MAX_MESSAGE_LEN};
pub use server::{handle_connection, ServerError};
