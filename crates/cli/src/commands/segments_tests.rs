// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn summary_lists_users_in_order() {
    let mut stats = SegmentStats {
        records: 3,
        corrupt: 1,
        ..SegmentStats::default()
    };
    stats.users.insert(1234, 2);
    stats.users.insert(7, 1);
    assert_eq!(
        summary_line(0, "REDO-2020-01-01T00:00:00.000.RDO", &stats),
        "0 REDO-2020-01-01T00:00:00.000.RDO records:3 corrupt:1 users:7=1,1234=2"
    );
}

#[test]
fn empty_segment_has_no_users() {
    assert_eq!(
        summary_line(2, "REDO-x.RDO", &SegmentStats::default()),
        "2 REDO-x.RDO records:0 corrupt:0 users:-"
    );
}

#[test]
fn unreadable_segment_gets_an_error_line() {
    let err = SegmentError::InvalidKey(3);
    assert_eq!(
        segment_line(1, "REDO-x.RDO".to_string(), Err(err)),
        "1 REDO-x.RDO error: invalid key length 3 (expected 8 bytes)"
    );
    assert_eq!(
        segment_line(2, "REDO-y.RDO".to_string(), Ok(SegmentStats::default())),
        "2 REDO-y.RDO records:0 corrupt:0 users:-"
    );
}
