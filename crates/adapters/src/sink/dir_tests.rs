// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

async fn open(dir: &tempfile::TempDir) -> DirSink {
    DirSink::open(dir.path().to_str().unwrap()).await.unwrap()
}

fn read(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn upsert_writes_collection_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = open(&dir).await;

    sink.upsert("players", 1, &json!({"name": "ann"}), None)
        .await
        .unwrap();
    sink.upsert("players", 1, &json!(9), Some("stats.hp"))
        .await
        .unwrap();
    sink.upsert("players", 2, &json!(true), Some("online"))
        .await
        .unwrap();

    assert_eq!(
        read(&sink.collection_path("players")),
        json!({
            "1": {"userid": 1, "name": "ann", "stats": {"hp": 9}},
            "2": {"userid": 2, "online": true},
        })
    );
    assert!(!dir.path().join("players.json.tmp").exists());
}

#[tokio::test]
async fn existing_collection_is_extended() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("bags.json"),
        r#"{"5": {"userid": 5, "gold": 1}}"#,
    )
    .unwrap();

    let mut sink = open(&dir).await;
    sink.upsert("bags", 5, &json!(2), Some("silver")).await.unwrap();

    assert_eq!(
        read(&dir.path().join("bags.json")),
        json!({"5": {"userid": 5, "gold": 1, "silver": 2}})
    );
}

#[tokio::test]
async fn open_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("out/replay");
    let sink = DirSink::open(nested.to_str().unwrap()).await.unwrap();
    assert!(sink.root().is_dir());
}

#[tokio::test]
async fn relative_path_is_rejected() {
    let result = DirSink::open("relative/dir").await;
    assert!(matches!(result, Err(SinkError::InvalidUri(_))));
}

#[tokio::test]
async fn collection_names_cannot_escape_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = open(&dir).await;
    for bad in ["", "../x", "a/b", ".hidden"] {
        let result = sink.upsert(bad, 1, &json!({}), None).await;
        assert!(
            matches!(result, Err(SinkError::InvalidCollection(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn failed_upsert_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = open(&dir).await;
    sink.upsert("players", 1, &json!({"a": 1}), None).await.unwrap();

    let result = sink.upsert("players", 1, &json!("scalar"), None).await;
    assert!(matches!(result, Err(SinkError::InvalidDocument(_))));

    sink.upsert("players", 2, &json!({"b": 2}), None).await.unwrap();
    let stored = read(&sink.collection_path("players"));
    assert_eq!(stored["1"], json!({"userid": 1, "a": 1}));
    assert_eq!(stored["2"], json!({"userid": 2, "b": 2}));
}

#[tokio::test]
async fn closed_sink_rejects_upserts() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = open(&dir).await;
    sink.close().await.unwrap();
    let result = sink.upsert("players", 1, &json!({}), None).await;
    assert!(matches!(result, Err(SinkError::Closed)));
}
