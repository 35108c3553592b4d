// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weft_core::TokenBuilder;
use weft_storage::VALID_TOTAL_MS;

fn writer(enabled: bool) -> (MeasurementsWriter, Arc<MemoryMeasurements>) {
    let sink = Arc::new(MemoryMeasurements::new());
    (MeasurementsWriter::new(PlaceId::new("SvcX", "opX"), sink.clone(), enabled), sink)
}

fn timing() -> InvocationTiming {
    InvocationTiming {
        task_arrival_ms: 1_000_100,
        invocation_ms: 1_000_150,
        publish_ms: 1_000_200,
        buffer: 2,
        capacity: 256,
    }
}

#[test]
fn writes_a_row_when_both_flags_agree() {
    let (writer, sink) = writer(true);
    writer.record(&TokenBuilder::new(1_000_000).monitor(true).build(), 0, timing());
    let rows = sink.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sequence_id, 1_000_000);
    assert_eq!(rows[0].service_name, "SvcX");
    assert_eq!(rows[0].total_marking, 3);
    assert_eq!(rows[0].max_queue_capacity, 256);
    assert!(rows[0].valid);
}

#[yare::parameterized(
    token_flag_alone    = { false, true },
    local_flag_alone    = { true, false },
    neither_flag        = { false, false },
)]
fn one_flag_alone_is_not_enough(local: bool, token_flag: bool) {
    let (writer, sink) = writer(local);
    writer.record(&TokenBuilder::new(1).monitor(token_flag).build(), 0, timing());
    assert!(sink.snapshot().is_empty());
}

#[test]
fn transport_arrival_stamp_is_preferred() {
    let (writer, sink) = writer(true);
    writer.record(&TokenBuilder::new(1).arrival(1_000_050).build(), 0, timing());
    assert_eq!(sink.snapshot()[0].arrival_time, 1_000_050);
}

#[test]
fn dequeue_time_is_the_arrival_fallback() {
    let (writer, sink) = writer(true);
    writer.record(&TokenBuilder::new(1).arrival(0).build(), 0, timing());
    assert_eq!(sink.snapshot()[0].arrival_time, 1_000_100);
}

#[test]
fn captured_workflow_start_is_preferred_over_monitor_data() {
    let (writer, sink) = writer(true);
    let token = TokenBuilder::new(1).workflow_start(500).build();
    writer.record(&token, 333, timing());
    assert_eq!(sink.snapshot()[0].workflow_start_time, 333);
    writer.record(&token, 0, timing());
    assert_eq!(sink.snapshot()[1].workflow_start_time, 500);
}

#[test]
fn ordering_invariant_holds_in_written_rows() {
    let (writer, sink) = writer(true);
    writer.record(&TokenBuilder::new(1).arrival(0).build(), 0, timing());
    let row = &sink.snapshot()[0];
    assert!(row.arrival_time <= row.invocation_time);
    assert!(row.invocation_time <= row.publish_time);
}

#[test]
fn slow_invocations_are_tagged_invalid() {
    let (writer, sink) = writer(true);
    let slow = InvocationTiming {
        task_arrival_ms: 1_000_000,
        invocation_ms: 1_000_100,
        publish_ms: 1_000_000 + VALID_TOTAL_MS + 1,
        buffer: 0,
        capacity: 256,
    };
    writer.record(&TokenBuilder::new(1).arrival(0).build(), 0, slow);
    assert!(!sink.snapshot()[0].valid);
}
