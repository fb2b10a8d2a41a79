// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redo log archiver daemon (redo-archiverd)
//!
//! Background process that accepts redo records from producers and appends
//! them to time-rotated segment files.
//!
//! Usage: `redo-archiverd [--config FILE] [DATA_DIR]`

use std::path::PathBuf;

use redo_archiver::lifecycle::{self, LifecycleError};
use redo_archiver::{server, Archiver};
use redo_core::{ArchiverConfig, SystemClock};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config_path, data_dir) = parse_args(std::env::args().skip(1))?;

    // Defaults, config file, environment, then the command line
    let mut config = ArchiverConfig::load(config_path.as_deref())?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    // Write startup marker to log (before tracing setup)
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!(data_dir = %config.data_dir.display(), "starting redo-archiverd");

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let (archiver, handle) = match Archiver::open(
        &config.data_dir,
        config.rotate_interval,
        config.queue_depth,
        SystemClock,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            let e = LifecycleError::from(e);
            write_startup_error(&config, &e);
            error!("failed to open segment: {}", e);
            daemon.shutdown();
            drop(log_guard);
            return Err(e.into());
        }
    };

    let (stop, stopped) = oneshot::channel::<()>();
    let mut writer = tokio::spawn(archiver.run(async move {
        let _ = stopped.await;
    }));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;

    info!(socket = %config.socket_path().display(), "daemon ready");

    // Signal ready for a supervising parent process
    println!("READY");

    // Set when the writer task ends on its own
    let mut finished = None;

    loop {
        tokio::select! {
            result = daemon.listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let handle = handle.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server::handle_connection(stream, handle).await {
                                warn!("error handling connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("error accepting connection: {}", e);
                    }
                }
            }

            _ = sighup.recv() => {
                info!("received SIGHUP, rotating segment");
                if handle.rotate().await.is_none() {
                    warn!("rotation refused, archiver closed");
                }
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }

            result = &mut writer => {
                error!("archiver stopped unexpectedly");
                finished = Some(result);
                break;
            }
        }
    }

    let result = match finished {
        Some(result) => result,
        None => {
            let _ = stop.send(());
            writer.await
        }
    };
    daemon.shutdown();

    match result {
        Ok(Ok(())) => {
            info!("daemon stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("archiver failed: {}", e);
            Err(e.into())
        }
        Err(e) => {
            error!("archiver task failed: {}", e);
            Err(e.into())
        }
    }
}

/// Parse `[--config FILE] [DATA_DIR]`
fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(Option<PathBuf>, Option<PathBuf>), String> {
    let mut config = None;
    let mut data_dir = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config requires a file")?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("usage: redo-archiverd [--config FILE] [DATA_DIR]");
                std::process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {other}"));
            }
            other if data_dir.is_none() => data_dir = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument: {other}")),
        }
    }
    Ok((config, data_dir))
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- redo-archiverd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- redo-archiverd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &ArchiverConfig) -> Result<(), LifecycleError> {
    use std::io::Write;

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file
fn write_startup_error(config: &ArchiverConfig, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {}", error);
}

fn setup_logging(
    config: &ArchiverConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = config.log_path();
    let invalid = || LifecycleError::InvalidLogPath(log_path.clone());
    let file_appender = tracing_appender::rolling::never(
        log_path.parent().ok_or_else(invalid)?,
        log_path.file_name().ok_or_else(invalid)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}
