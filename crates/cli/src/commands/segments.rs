// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `redo segments` - per-segment summary

use anyhow::{Context, Result};
use clap::Args;
use redo_storage::{SegmentError, SegmentSet, SegmentStats};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Args)]
pub struct SegmentsArgs {
    /// Directory holding segment files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// How long to wait for a segment held by the archiver
    #[arg(long, value_parser = humantime::parse_duration)]
    pub open_timeout: Option<Duration>,
}

pub async fn handle(args: SegmentsArgs) -> Result<()> {
    let config = super::replay_config(args.data_dir);
    let timeout = args.open_timeout.unwrap_or(config.open_timeout);
    let set = SegmentSet::open_blocking(&config.data_dir, timeout)
        .await
        .with_context(|| format!("failed to open segments in {}", config.data_dir.display()))?;

    let mut out = std::io::stdout().lock();
    if set.is_empty() {
        writeln!(out, "No segments")?;
        return Ok(());
    }
    for (i, segment) in set.segments().iter().enumerate() {
        writeln!(out, "{}", segment_line(i, segment.name().file_name(), segment.stats()))?;
    }
    Ok(())
}

/// A segment that cannot be read gets an error line; the listing goes on
pub(crate) fn segment_line(
    index: usize,
    name: String,
    stats: Result<SegmentStats, SegmentError>,
) -> String {
    match stats {
        Ok(stats) => summary_line(index, &name, &stats),
        Err(e) => {
            warn!(segment = %name, error = %e, "failed to read segment");
            format!("{index} {name} error: {e}")
        }
    }
}

/// `<index> <name> records:N corrupt:N users:<user>=<count>,...`
pub(crate) fn summary_line(index: usize, name: &str, stats: &SegmentStats) -> String {
    let users = stats
        .users
        .iter()
        .map(|(user, count)| format!("{user}={count}"))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{index} {name} records:{} corrupt:{} users:{}",
        stats.records,
        stats.corrupt,
        if users.is_empty() { "-" } else { users.as_str() }
    )
}

#[cfg(test)]
#[path = "segments_tests.rs"]
mod tests;
