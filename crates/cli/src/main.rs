// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! redo - inspect, replay, and feed the redo log archive

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{emit, replay, segments};

#[derive(Parser)]
#[command(
    name = "redo",
    version,
    about = "Redo log archive tools: query and replay segments, emit records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive query and replay over the archived segments
    Replay(replay::ReplayArgs),
    /// Per-segment record counts and users
    Segments(segments::SegmentsArgs),
    /// Encode a record and send it to the archiver
    Emit(emit::EmitArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    match cli.command {
        Commands::Replay(args) => replay::handle(args).await,
        Commands::Segments(args) => segments::handle(args).await,
        Commands::Emit(args) => emit::handle(args).await,
    }
}

/// Diagnostics go to stderr so command output on stdout stays clean
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
