// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;

fn config(dir: &Path) -> ArchiverConfig {
    ArchiverConfig {
        data_dir: dir.join("data"),
        ..ArchiverConfig::default()
    }
}

#[tokio::test]
async fn startup_locks_and_binds() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let mut daemon = startup(&config).await.unwrap();
    assert!(config.socket_path().exists());
    let pid = std::fs::read_to_string(config.lock_path()).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    daemon.shutdown();
    assert!(!config.socket_path().exists());
    assert!(!config.lock_path().exists());
}

#[tokio::test]
async fn second_instance_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let _first = startup(&config).await.unwrap();
    let second = startup(&config).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));

    // The running instance keeps its socket
    assert!(config.socket_path().exists());
}

#[tokio::test]
async fn stale_socket_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    std::fs::create_dir_all(&config.data_dir).unwrap();
    std::fs::write(config.socket_path(), b"stale").unwrap();

    let mut daemon = startup(&config).await.unwrap();
    tokio::net::UnixStream::connect(config.socket_path())
        .await
        .unwrap();
    daemon.shutdown();
}

#[tokio::test]
async fn bind_failure_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    // A socket path whose parent is a regular file cannot be created
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    config.socket_path = Some(blocker.join("archiver.sock"));

    let result = startup(&config).await;
    assert!(result.is_err());
    assert!(!config.lock_path().exists());
}
