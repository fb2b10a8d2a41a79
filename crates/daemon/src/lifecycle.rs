// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;
use redo_core::{ArchiverConfig, ConfigError};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::archiver::ArchiverError;

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: ArchiverConfig,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
}

impl DaemonState {
    /// Remove the socket and PID files. The lock is released on drop.
    pub fn shutdown(&mut self) {
        info!("shutting down daemon");

        let socket_path = self.config.socket_path();
        if socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&socket_path) {
                warn!(path = %socket_path.display(), error = %e, "failed to remove socket file");
            }
        }

        let lock_path = self.config.lock_path();
        if lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&lock_path) {
                warn!(path = %lock_path.display(), error = %e, "failed to remove PID file");
            }
        }

        info!("daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire lock: archiver already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("invalid log path {0}")]
    InvalidLogPath(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("archiver error: {0}")]
    Archiver(#[from] ArchiverError),
}

/// Take the data directory lock and bind the inbound socket
pub async fn startup(config: &ArchiverConfig) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.data_dir)?;

    // Lock FIRST; nothing below may touch files owned by a running archiver
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(config.lock_path())?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    match bind(config, &mut lock_file) {
        Ok(listener) => {
            info!(
                data_dir = %config.data_dir.display(),
                socket = %config.socket_path().display(),
                "daemon started"
            );
            Ok(DaemonState {
                config: config.clone(),
                lock_file,
                listener,
            })
        }
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

fn bind(config: &ArchiverConfig, lock_file: &mut File) -> Result<UnixListener, LifecycleError> {
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let socket_path = config.socket_path();
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // A leftover socket from a crashed archiver; the lock proves it is stale
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    UnixListener::bind(&socket_path).map_err(|e| LifecycleError::BindFailed(socket_path, e))
}

fn cleanup_on_failure(config: &ArchiverConfig) {
    let socket_path = config.socket_path();
    if socket_path.exists() {
        let _ = std::fs::remove_file(&socket_path);
    }
    let lock_path = config.lock_path();
    if lock_path.exists() {
        let _ = std::fs::remove_file(&lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
