// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `redo segments`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::setup_archive;

#[test]
fn test_segments_summary() {
    let temp = setup_archive();
    Command::cargo_bin("redo")
        .unwrap()
        .arg("segments")
        .arg("--data-dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(
            "0 REDO-2020-01-01T00:00:00.000.RDO records:2 corrupt:0 users:1=1,2=1\n\
             1 REDO-2020-01-02T00:00:00.000.RDO records:1 corrupt:0 users:1=1\n",
        );
}

#[test]
fn test_segments_empty() {
    let temp = tempfile::tempdir().unwrap();
    Command::cargo_bin("redo")
        .unwrap()
        .arg("segments")
        .arg("--data-dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout("No segments\n");
}
