// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod emit;
pub mod replay;
pub mod segments;

use redo_core::ReplayConfig;
use std::path::PathBuf;

/// Replay settings from the environment, with a `--data-dir` override
pub(crate) fn replay_config(data_dir: Option<PathBuf>) -> ReplayConfig {
    let mut config = ReplayConfig::from_env();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    config
}
