// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use redo_adapters::{FakeConnector, SinkCall};
use redo_core::{encode, Change, RedoRecord};
use redo_storage::{Indexer, SegmentName, SegmentStore, DEFAULT_OPEN_TIMEOUT};
use serde_json::json;
use std::path::Path;

const JAN_1: i64 = 1_577_836_800_000; // 2020-01-01T00:00:00Z
const HOUR: i64 = 3_600_000;

fn ts(millis: i64, seq: u64) -> u64 {
    snowflake::compose(millis as u64, seq)
}

fn write_segment(dir: &Path, day: u32, records: &[RedoRecord]) {
    let name = SegmentName::new(Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap());
    let mut store = SegmentStore::create(dir, name).unwrap();
    for record in records {
        store.append(&encode(record).unwrap()).unwrap();
    }
    store.close();
}

/// Two segments: users 1234 and 7 spread over Jan 1 to Jan 3
fn fixture(dir: &Path) {
    write_segment(
        dir,
        1,
        &[
            RedoRecord::new("login", 1234, ts(JAN_1 - HOUR, 1)),
            RedoRecord::new("move", 1234, ts(JAN_1, 2)),
            RedoRecord::new("move", 7, ts(JAN_1 + HOUR, 3)),
        ],
    );
    write_segment(
        dir,
        2,
        &[
            RedoRecord::new("move", 1234, ts(JAN_1 + 24 * HOUR, 4)),
            RedoRecord::new("buy", 1234, ts(JAN_1 + 24 * HOUR + 1, 5)),
            RedoRecord::new("buy", 7, ts(JAN_1 + 30 * HOUR, 6)),
        ],
    );
}

async fn engine(dir: &Path, connector: FakeConnector) -> QueryEngine<FakeConnector> {
    let set = SegmentSet::open(dir, DEFAULT_OPEN_TIMEOUT).unwrap();
    let index = Indexer::build(&set).await;
    QueryEngine::new(set, index, connector)
}

async fn exec(engine: &mut QueryEngine<FakeConnector>, line: &str) -> String {
    let mut out = Vec::new();
    engine.execute(line, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn sum_and_ls_agree_with_brute_force() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    let filters: [&[&str]; 5] = [
        &[],
        &["USER 1234"],
        &["USER 7"],
        &[r#"DURATION "2020-01-01T00:00:00" "2020-01-02T00:00:00""#],
        &["USER 1234", r#"DURATION "2020-01-01T00:00:00" "2020-01-02T00:00:00""#],
    ];
    for lines in filters {
        exec(&mut engine, "CLEAR").await;
        for line in lines {
            exec(&mut engine, line).await;
        }

        let session = engine.session().clone();
        let expected: Vec<usize> = engine
            .index()
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| session.matches(e))
            .map(|(i, _)| i + 1)
            .collect();

        let sum = exec(&mut engine, "SUM").await;
        assert_eq!(sum, format!("total:{}\n", expected.len()), "{lines:?}");

        let ls = exec(&mut engine, "LS").await;
        let listed: Vec<usize> = ls
            .lines()
            .map(|l| l.split_whitespace().next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(listed, expected, "{lines:?}");
    }
}

#[tokio::test]
async fn user_and_duration_scenario() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    exec(&mut engine, "USER 1234").await;
    exec(
        &mut engine,
        r#"DURATION "2020-01-01T00:00:00" "2020-01-02T00:00:00""#,
    )
    .await;
    // Jan 1 00:00 and Jan 2 00:00 are inside; the one before midnight and
    // the one a millisecond after Jan 2 are not
    assert_eq!(exec(&mut engine, "SUM").await, "total:2\n");
}

#[tokio::test]
async fn ls_lists_position_user_segment_key_and_time() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    exec(&mut engine, "USER 7").await;
    assert_eq!(
        exec(&mut engine, "LS").await,
        "3 user_id=7 segment=0 key=3 created_at=2020-01-01T01:00:00.000Z\n\
         6 user_id=7 segment=1 key=3 created_at=2020-01-02T06:00:00.000Z\n"
    );
}

#[tokio::test]
async fn failed_duration_leaves_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    exec(&mut engine, "USER 1234").await;
    exec(
        &mut engine,
        r#"DURATION "2020-01-01T00:00:00" "2020-01-02T00:00:00""#,
    )
    .await;
    let before = engine.session().clone();

    let mut out = Vec::new();
    let result = engine
        .execute(r#"DURATION "2020-01-01" "tomorrow""#, &mut out)
        .await;
    assert!(matches!(result, Err(EngineError::InvalidTime { .. })));
    assert_eq!(engine.session(), &before);
    assert_eq!(exec(&mut engine, "SUM").await, "total:2\n");
}

#[tokio::test]
async fn clear_removes_filters() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    exec(&mut engine, "USER 7").await;
    assert_eq!(exec(&mut engine, "SUM").await, "total:2\n");
    exec(&mut engine, "clear").await;
    assert_eq!(exec(&mut engine, "SUM").await, "total:6\n");
}

#[tokio::test]
async fn show_prints_record() {
    let dir = tempfile::tempdir().unwrap();
    let created = JAN_1 + 5 * HOUR + 123;
    write_segment(
        dir.path(),
        1,
        &[RedoRecord::new("move", 1, ts(created, 77)).with_change(Change::with_document(
            "players",
            "stats.hp",
            &json!(42),
        ))],
    );
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    let out = exec(&mut engine, "SHOW 1").await;
    assert_eq!(
        out,
        "user_id=1\n\
         api=move\n\
         created_at=2020-01-01T05:00:00.123Z\n\
         change #0 collection:players field:stats.hp\n  42\n"
    );
}

#[tokio::test]
async fn show_ignores_filters() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    exec(&mut engine, "USER 7").await;
    let out = exec(&mut engine, "SHOW 1").await;
    assert!(out.starts_with("user_id=1234\napi=login\n"), "{out}");
}

#[tokio::test]
async fn show_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    for position in [0, 7] {
        let mut out = Vec::new();
        let result = engine.execute(&format!("SHOW {position}"), &mut out).await;
        assert!(
            matches!(result, Err(EngineError::NoSuchPosition(p)) if p == position),
            "SHOW {position}"
        );
    }
}

#[tokio::test]
async fn replay_applies_matching_records_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_segment(
        dir.path(),
        1,
        &[
            RedoRecord::new("login", 1, ts(JAN_1, 1)).with_change(Change::with_document(
                "players",
                "",
                &json!({"name": "ann", "hp": 1}),
            )),
            RedoRecord::new("move", 2, ts(JAN_1, 2)).with_change(Change::with_document(
                "players",
                "hp",
                &json!(5),
            )),
            RedoRecord::new("hit", 1, ts(JAN_1, 3)).with_change(Change::with_document(
                "players",
                "hp",
                &json!(0),
            )),
        ],
    );
    let connector = FakeConnector::new();
    let mut engine = engine(dir.path(), connector.clone()).await;

    exec(&mut engine, "USER 1").await;
    let out = exec(&mut engine, r#"REPLAY "memory:""#).await;
    assert_eq!(
        out,
        "replayed records:2 failed_records:0 changes:2 failed_changes:0\n"
    );

    let calls = connector.calls();
    assert_eq!(
        calls.first(),
        Some(&SinkCall::Connect {
            uri: "memory:".to_string()
        })
    );
    assert_eq!(calls.last(), Some(&SinkCall::Close));
    assert_eq!(connector.upserts().len(), 2);
    assert_eq!(
        connector.document("players", 1),
        Some(json!({"userid": 1, "name": "ann", "hp": 0}))
    );
    assert!(connector.document("players", 2).is_none());
}

#[tokio::test]
async fn replay_connect_failure_is_line_error() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let connector = FakeConnector::new();
    connector.refuse_connect();
    let mut engine = engine(dir.path(), connector).await;

    let mut out = Vec::new();
    let result = engine.execute(r#"REPLAY "memory:""#, &mut out).await;
    assert!(matches!(result, Err(EngineError::Sink(_))));
    assert!(result.unwrap_err().is_recoverable());
}

#[tokio::test]
async fn files_and_users() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    assert_eq!(
        exec(&mut engine, "FILES").await,
        "0 REDO-2020-01-01T00:00:00.000.RDO records:3\n\
         1 REDO-2020-01-02T00:00:00.000.RDO records:3\n"
    );

    exec(&mut engine, "USER 7").await;
    exec(
        &mut engine,
        r#"DURATION "2020-01-01T00:00:00" "2020-01-02T00:00:00""#,
    )
    .await;
    assert_eq!(
        exec(&mut engine, "USERS").await,
        "user_id=7 count:1\nuser_id=1234 count:2\n"
    );
}

#[tokio::test]
async fn run_reports_bad_lines_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    let input = "SUM\n\nUSER\nbogus\nUSER 7\nSUM\nREPLAY \"memory:\n";
    let mut out = Vec::new();
    engine.run(input.as_bytes(), &mut out, false).await.unwrap();

    let out = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "total:6");
    assert!(lines[1].starts_with("error: syntax error: expected a number"));
    assert_eq!(lines[2], "error: syntax error: unknown command: BOGUS");
    assert_eq!(lines[3], "total:2");
    assert_eq!(lines[4], "error: syntax error: unterminated string");
    assert_eq!(lines.len(), 5);
}

#[tokio::test]
async fn run_survives_lines_that_are_not_utf8() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    let input: &[u8] = b"SUM\n\"\xff\xfe\"\nUSER 7\r\nSUM\n";
    let mut out = Vec::new();
    engine.run(input, &mut out, false).await.unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "total:6\nerror: syntax error: line is not valid UTF-8\ntotal:2\n"
    );
}

#[tokio::test]
async fn run_prints_prompt_for_terminals() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine(dir.path(), FakeConnector::new()).await;

    let mut out = Vec::new();
    engine.run("SUM\n".as_bytes(), &mut out, true).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "> total:0\n> \n");
}

#[tokio::test]
async fn help_prints_reference() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine(dir.path(), FakeConnector::new()).await;
    let out = exec(&mut engine, "help").await;
    assert!(out.contains("DURATION"));
    assert!(out.contains("REPLAY"));
}
