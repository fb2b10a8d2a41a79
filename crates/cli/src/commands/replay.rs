// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `redo replay` - interactive query and replay loop

use anyhow::{Context, Result};
use clap::Args;
use redo_adapters::{TracedConnector, UriConnector};
use redo_engine::QueryEngine;
use redo_storage::{Indexer, SegmentSet};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{info, warn};

#[derive(Args)]
pub struct ReplayArgs {
    /// Directory holding segment files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// How long to wait for a segment held by the archiver
    #[arg(long, value_parser = humantime::parse_duration)]
    pub open_timeout: Option<Duration>,

    /// Upper bound for a single sink upsert
    #[arg(long, value_parser = humantime::parse_duration)]
    pub sink_timeout: Option<Duration>,
}

pub async fn handle(args: ReplayArgs) -> Result<()> {
    let mut config = super::replay_config(args.data_dir);
    if let Some(timeout) = args.open_timeout {
        config.open_timeout = timeout;
    }
    if let Some(timeout) = args.sink_timeout {
        config.sink_timeout = timeout;
    }

    let set = SegmentSet::open_blocking(&config.data_dir, config.open_timeout)
        .await
        .with_context(|| format!("failed to open segments in {}", config.data_dir.display()))?;
    let index = Indexer::build(&set).await;
    if index.skipped_segments() > 0 || index.skipped_records() > 0 {
        warn!(
            segments = index.skipped_segments(),
            records = index.skipped_records(),
            "some archive entries could not be indexed"
        );
    }
    info!(segments = set.len(), records = index.len(), "archive loaded");

    // The request bound matches the per-upsert bound
    let connector = UriConnector::new().with_request_timeout(config.sink_timeout);
    let mut engine = QueryEngine::new(set, index, TracedConnector::new(connector))
        .with_sink_timeout(config.sink_timeout);

    let stdin = tokio::io::stdin();
    let prompt = std::io::stdin().is_terminal();
    let mut out = std::io::stdout();
    engine.run(BufReader::new(stdin), &mut out, prompt).await?;
    Ok(())
}
