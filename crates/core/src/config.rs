// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration for the archiver daemon and the replay tool
//!
//! Values are layered: built-in defaults, then an optional TOML file,
//! then `REDO_*` environment variables. Command-line flags are applied
//! last by the binaries.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default data directory holding segment files
pub const DEFAULT_DATA_DIR: &str = "/data";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("invalid config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },
}

/// Archiver daemon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiverConfig {
    /// Directory holding segment files
    pub data_dir: PathBuf,
    /// Inbound socket; defaults to `<data_dir>/archiver.sock`
    pub socket_path: Option<PathBuf>,
    /// Segment rotation period
    #[serde(with = "humantime_serde")]
    pub rotate_interval: Duration,
    /// Capacity of the writer queue
    pub queue_depth: usize,
    /// Daemon log file; defaults to `<data_dir>/archiver.log`
    pub log_path: Option<PathBuf>,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            socket_path: None,
            rotate_interval: Duration::from_secs(24 * 60 * 60),
            queue_depth: 1024,
            log_path: None,
        }
    }
}

impl ArchiverConfig {
    /// Load defaults, an optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => read_toml(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply `REDO_*` overrides using the given variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(dir) = lookup("REDO_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(socket) = lookup("REDO_SOCKET") {
            self.socket_path = Some(PathBuf::from(socket));
        }
        if let Some(interval) = lookup("REDO_ROTATE_INTERVAL") {
            self.rotate_interval =
                humantime::parse_duration(&interval).map_err(|e| ConfigError::Env {
                    var: "REDO_ROTATE_INTERVAL",
                    message: e.to_string(),
                })?;
        }
        if let Some(depth) = lookup("REDO_QUEUE_DEPTH") {
            self.queue_depth = depth.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Env {
                    var: "REDO_QUEUE_DEPTH",
                    message: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    pub fn socket_path(&self) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("archiver.sock"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("archiver.log"))
    }

    /// Lock/PID file guarding the data directory against a second writer
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join("archiver.pid")
    }
}

/// Replay tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Directory holding segment files
    pub data_dir: PathBuf,
    /// How long to wait for a segment held by a writer
    #[serde(with = "humantime_serde")]
    pub open_timeout: Duration,
    /// Upper bound for a single sink upsert
    #[serde(with = "humantime_serde")]
    pub sink_timeout: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            open_timeout: Duration::from_secs(2),
            sink_timeout: Duration::from_secs(30),
        }
    }
}

impl ReplayConfig {
    /// Defaults with environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|var| std::env::var(var).ok());
        config
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(dir) = lookup("REDO_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
