// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instrumentation: assemble and emit trace records.
//!
//! Sinks are thread-safe and append-only. Sink failures are logged and
//! never propagate into the orchestrator loop.

use parking_lot::Mutex;
use std::sync::Arc;
use weft_core::{Clock, PlaceId, Token, TraceKind, TraceRecord};
use weft_storage::TraceLog;

pub trait TraceSink: Send + Sync {
    fn record(&self, record: TraceRecord);
}

/// Collects records in memory; tests and embedders that export elsewhere.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<TraceRecord>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    pub fn snapshot(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    pub fn kinds(&self) -> Vec<TraceKind> {
        self.records.lock().iter().map(|r| r.event_type).collect()
    }
}

impl TraceSink for MemorySink {
    fn record(&self, record: TraceRecord) {
        self.records.lock().push(record);
    }
}

/// Appends records to the on-disk trace log.
pub struct FileSink {
    log: Mutex<TraceLog>,
}

impl FileSink {
    pub fn new(log: TraceLog) -> FileSink {
        FileSink { log: Mutex::new(log) }
    }
}

impl TraceSink for FileSink {
    fn record(&self, record: TraceRecord) {
        let mut log = self.log.lock();
        if let Err(e) = log.append(&record).and_then(|()| log.flush()) {
            tracing::error!(error = %e, "failed to append trace record");
        }
    }
}

/// Emits the per-place record stream. `buffer` is the residual intake
/// depth captured at dequeue; marking is always `buffer + 1`.
pub struct Instrumenter<C: Clock> {
    place: PlaceId,
    sink: Arc<dyn TraceSink>,
    clock: C,
}

impl<C: Clock> Instrumenter<C> {
    pub fn new(place: PlaceId, sink: Arc<dyn TraceSink>, clock: C) -> Self {
        Self { place, sink, clock }
    }

    fn base(&self, token: &Token, kind: TraceKind, buffer: u32) -> TraceRecord {
        TraceRecord {
            timestamp: self.clock.epoch_ms(),
            token_id: token.id,
            place_or_transition: self.place.to_string(),
            event_type: kind,
            to_place: None,
            transition_id: None,
            marking: buffer + 1,
            buffer,
            workflow_start_time: token.workflow_start_ms,
            arc_value: None,
            source_event_generator: token.source_generator.clone(),
            event_generator_timestamp: token.generator_timestamp_ms,
        }
    }

    /// A fresh instance injected at this transition.
    pub fn generated(&self, token: &Token, transition_id: &str, buffer: u32) {
        let mut record = self.base(token, TraceKind::Generated, buffer);
        record.transition_id = Some(transition_id.to_string());
        self.sink.record(record);
    }

    pub fn buffered(&self, token: &Token, buffer: u32) {
        self.sink.record(self.base(token, TraceKind::Buffered, buffer));
    }

    pub fn enter(&self, token: &Token, buffer: u32) {
        self.sink.record(self.base(token, TraceKind::Enter, buffer));
    }

    pub fn exit(&self, token: &Token, to_place: &str, arc_value: Option<String>, buffer: u32) {
        let mut record = self.base(token, TraceKind::Exit, buffer);
        record.to_place = Some(to_place.to_string());
        record.arc_value = arc_value;
        self.sink.record(record);
    }

    /// One record per child at the parent's exit; the child id carries
    /// the record and the parent id rides in `transition_id`.
    pub fn fork(&self, parent: &Token, child: &Token, to_place: &str, buffer: u32) {
        let mut record = self.base(parent, TraceKind::Fork, buffer);
        record.token_id = child.id;
        record.transition_id = Some(parent.id.to_string());
        record.to_place = Some(to_place.to_string());
        self.sink.record(record);
    }

    /// A non-surviving participant consumed at join firing; the record
    /// carries that branch's own provenance.
    pub fn join_consumed(&self, consumed: &Token, buffer: u32) {
        self.sink.record(self.base(consumed, TraceKind::JoinConsumed, buffer));
    }

    pub fn terminate(&self, token: &Token, buffer: u32) {
        self.sink.record(self.base(token, TraceKind::Terminate, buffer));
    }
}
