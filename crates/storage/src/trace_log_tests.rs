// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use smol_str::SmolStr;
use weft_core::{TokenId, TraceKind};

fn record(id: i32, kind: TraceKind) -> TraceRecord {
    TraceRecord {
        timestamp: 1_000_500,
        token_id: TokenId(id),
        place_or_transition: "SvcX.opX".to_string(),
        event_type: kind,
        to_place: None,
        transition_id: None,
        marking: 1,
        buffer: 0,
        workflow_start_time: 1_000_000,
        arc_value: None,
        source_event_generator: SmolStr::new("gen"),
        event_generator_timestamp: 0,
    }
}

#[test]
fn append_flush_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");
    let mut log = TraceLog::open(&path).unwrap();
    log.append(&record(1_000_000, TraceKind::Buffered)).unwrap();
    log.append(&record(1_000_000, TraceKind::Enter)).unwrap();
    log.append(&record(1_000_000, TraceKind::Exit)).unwrap();
    log.flush().unwrap();

    let records = TraceLog::read_all(&path).unwrap();
    let kinds: Vec<TraceKind> = records.iter().map(|r| r.event_type).collect();
    assert_eq!(kinds, [TraceKind::Buffered, TraceKind::Enter, TraceKind::Exit]);
}

#[test]
fn reopening_appends_rather_than_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");
    {
        let mut log = TraceLog::open(&path).unwrap();
        log.append(&record(1, TraceKind::Buffered)).unwrap();
        log.flush().unwrap();
    }
    {
        let mut log = TraceLog::open(&path).unwrap();
        log.append(&record(2, TraceKind::Buffered)).unwrap();
        log.flush().unwrap();
    }
    assert_eq!(TraceLog::read_all(&path).unwrap().len(), 2);
}

#[test]
fn read_of_missing_file_is_open_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        TraceLog::read_all(&dir.path().join("absent.jsonl")),
        Err(StorageError::Open { .. })
    ));
}
