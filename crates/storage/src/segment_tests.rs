// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn instant(h: u32, m: u32, s: u32, ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 2, h, m, s).unwrap() + chrono::Duration::milliseconds(ms)
}

#[test]
fn name_layout() {
    let name = SegmentName::new(instant(15, 4, 5, 123));
    assert_eq!(name.file_name(), "REDO-2020-01-02T15:04:05.123.RDO");
    assert_eq!(name.to_string(), name.file_name());
}

#[test]
fn name_parse_roundtrip() {
    let name = SegmentName::new(instant(15, 4, 5, 7));
    assert_eq!(SegmentName::parse(&name.file_name()).unwrap(), name);
}

#[test]
fn name_parse_accepts_second_resolution() {
    let name = SegmentName::parse("REDO-2020-01-02T15:04:05.RDO").unwrap();
    assert_eq!(name.created_at(), instant(15, 4, 5, 0));
}

#[test]
fn name_parse_rejects_foreign_files() {
    for bad in [
        "archiver.log",
        "REDO-2020-01-02T15:04:05.RDX",
        "REDO-yesterday.RDO",
        "REDO-2020-01-02T15:04:05.12.RDO",
        "REDO-2020-01-02T15:04:05.abc.RDO",
    ] {
        assert!(
            matches!(SegmentName::parse(bad), Err(SegmentError::InvalidName(_))),
            "{bad} should not parse"
        );
    }
}

#[test]
fn names_order_by_instant() {
    let a = SegmentName::parse("REDO-2020-01-02T15:04:05.RDO").unwrap();
    let b = SegmentName::parse("REDO-2020-01-02T15:04:05.001.RDO").unwrap();
    let c = SegmentName::parse("REDO-2020-01-03T00:00:00.000.RDO").unwrap();
    assert!(a < b && b < c);
}

#[test]
fn successor_is_strictly_later() {
    let current = SegmentName::new(instant(1, 0, 0, 500));
    assert_eq!(
        current.successor(instant(1, 0, 0, 500)).created_at(),
        instant(1, 0, 0, 501)
    );
    assert_eq!(
        current.successor(instant(1, 0, 0, 100)).created_at(),
        instant(1, 0, 0, 501)
    );
    assert_eq!(
        current.successor(instant(2, 0, 0, 0)).created_at(),
        instant(2, 0, 0, 0)
    );
}

#[test]
fn keys_are_big_endian() {
    assert_eq!(encode_key(1), [0, 0, 0, 0, 0, 0, 0, 1]);
    assert_eq!(decode_key(&encode_key(258)).unwrap(), 258);
    assert!(matches!(decode_key(&[1, 2]), Err(SegmentError::InvalidKey(2))));
}

#[test]
fn append_assigns_keys_from_one() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SegmentStore::create(dir.path(), SegmentName::new(instant(0, 0, 0, 0))).unwrap();
    assert_eq!(store.last_key(), 0);

    let keys: Vec<u64> = (0..5)
        .map(|i| store.append(format!("record-{i}").as_bytes()).unwrap())
        .collect();
    assert_eq!(keys, vec![1, 2, 3, 4, 5]);
    assert_eq!(store.last_key(), 5);
    assert_eq!(store.get(3).unwrap().unwrap(), b"record-2");
    assert!(store.get(6).unwrap().is_none());
}

#[test]
fn reopen_continues_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let name = SegmentName::new(instant(0, 0, 0, 0));

    {
        let mut store = SegmentStore::create(dir.path(), name).unwrap();
        store.append(b"a").unwrap();
        store.append(b"b").unwrap();
        store.close();
    }

    let mut store = SegmentStore::create(dir.path(), name).unwrap();
    assert_eq!(store.last_key(), 2);
    assert_eq!(store.append(b"c").unwrap(), 3);
}

#[test]
fn create_makes_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a/b");
    let store = SegmentStore::create(&nested, SegmentName::new(instant(0, 0, 0, 0))).unwrap();
    assert!(store.path().starts_with(&nested));
    assert!(store.path().exists());
}
