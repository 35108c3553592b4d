// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Measurement rows around each service invocation.

use parking_lot::Mutex;
use std::sync::Arc;
use weft_core::{PlaceId, Token};
use weft_storage::{MeasurementLog, MeasurementRow};

pub trait MeasurementSink: Send + Sync {
    fn write(&self, row: MeasurementRow);
}

/// Collects rows in memory; tests and embedders that export elsewhere.
#[derive(Default)]
pub struct MemoryMeasurements {
    rows: Mutex<Vec<MeasurementRow>>,
}

impl MemoryMeasurements {
    pub fn new() -> MemoryMeasurements {
        MemoryMeasurements::default()
    }

    pub fn snapshot(&self) -> Vec<MeasurementRow> {
        self.rows.lock().clone()
    }
}

impl MeasurementSink for MemoryMeasurements {
    fn write(&self, row: MeasurementRow) {
        self.rows.lock().push(row);
    }
}

/// Appends rows to the on-disk measurement log.
pub struct FileMeasurements {
    log: Mutex<MeasurementLog>,
}

impl FileMeasurements {
    pub fn new(log: MeasurementLog) -> FileMeasurements {
        FileMeasurements { log: Mutex::new(log) }
    }
}

impl MeasurementSink for FileMeasurements {
    fn write(&self, row: MeasurementRow) {
        let mut log = self.log.lock();
        if let Err(e) = log.append(&row).and_then(|()| log.flush()) {
            tracing::error!(error = %e, "failed to append measurement row");
        }
    }
}

/// Wall-clock observations captured by the orchestrator around one
/// invocation.
#[derive(Debug, Clone, Copy)]
pub struct InvocationTiming {
    /// Dequeue time at this place.
    pub task_arrival_ms: u64,
    pub invocation_ms: u64,
    pub publish_ms: u64,
    /// Residual intake depth at dequeue.
    pub buffer: u32,
    pub capacity: u32,
}

/// Assembles and gates measurement rows for one place.
///
/// A row is written only when the place's own monitoring setting AND the
/// token's monitor flag agree.
pub struct MeasurementsWriter {
    place: PlaceId,
    sink: Arc<dyn MeasurementSink>,
    enabled: bool,
}

impl MeasurementsWriter {
    pub fn new(place: PlaceId, sink: Arc<dyn MeasurementSink>, enabled: bool) -> Self {
        Self { place, sink, enabled }
    }

    /// Record one invocation. `workflow_start_ms` is the orchestrator's
    /// captured value (join-adopted); 0 falls back to the token's
    /// monitor-data value. Arrival prefers the transport stamp over the
    /// dequeue time.
    pub fn record(&self, token: &Token, workflow_start_ms: u64, timing: InvocationTiming) {
        if !(self.enabled && token.monitor) {
            return;
        }
        let arrival_time = if token.event_arrival_ms > 0 {
            token.event_arrival_ms
        } else {
            timing.task_arrival_ms
        };
        let workflow_start_time =
            if workflow_start_ms > 0 { workflow_start_ms } else { token.workflow_start_ms };
        let row = MeasurementRow {
            sequence_id: token.id.0,
            service_name: self.place.service.clone(),
            operation: self.place.operation.clone(),
            arrival_time,
            invocation_time: timing.invocation_ms,
            publish_time: timing.publish_ms,
            workflow_start_time,
            buffer_size: timing.buffer,
            max_queue_capacity: timing.capacity,
            total_marking: timing.buffer + 1,
            valid: true,
        }
        .tagged();
        self.sink.write(row);
    }
}

#[cfg(test)]
#[path = "measure_tests.rs"]
mod tests;
