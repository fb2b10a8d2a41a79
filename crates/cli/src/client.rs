// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archiver client for the `emit` command

use std::path::{Path, PathBuf};
use std::time::Duration;

use redo_archiver::protocol::{self, Ack, ProtocolError};
use thiserror::Error;
use tokio::net::UnixStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for one submit round trip
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("REDO_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("archiver not running (no socket at {0})")]
    ArchiverNotRunning(PathBuf),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connection to a running archiver
pub struct ArchiverClient {
    stream: UnixStream,
}

impl ArchiverClient {
    /// Connect to the archiver socket
    pub async fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::ArchiverNotRunning(socket_path.to_path_buf()));
        }
        let stream = UnixStream::connect(socket_path).await?;
        Ok(Self { stream })
    }

    /// Send one encoded record and wait for its acknowledgement
    pub async fn submit(&mut self, payload: &[u8]) -> Result<Ack, ClientError> {
        self.submit_with_timeout(payload, timeout_ipc()).await
    }

    async fn submit_with_timeout(
        &mut self,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Ack, ClientError> {
        let (mut reader, mut writer) = self.stream.split();

        tokio::time::timeout(timeout, protocol::write_message(&mut writer, payload))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let reply = tokio::time::timeout(timeout, protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&reply)?)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
