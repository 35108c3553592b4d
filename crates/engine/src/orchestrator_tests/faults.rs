// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-token fault policy: the loop logs, drops, and keeps running.

use super::*;
use crate::invoker::InvokeError;
use weft_core::TraceKind;

fn edge_facts() -> Vec<Fact> {
    vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
    ]
}

#[tokio::test]
async fn single_input_wrong_attribute_drops() {
    let h = harness(edge_facts(), JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |_| {
            panic!("service must not run for a mismatched attribute");
        });
    });

    h.deliver(TokenBuilder::new(1_000_000).slot("wrong", "42").build()).await;

    assert!(h.publisher.is_empty());
    assert!(h.rows.snapshot().is_empty());
    // arrival was still observed; nothing fired
    assert_eq!(h.trace.kinds(), [TraceKind::Buffered, TraceKind::Enter]);

    // the loop survives and processes the next token normally
    h.deliver(TokenBuilder::new(1_000_001).slot("in", "42").build()).await;
    assert!(!h.publisher.is_empty());
}

#[tokio::test]
async fn anyof_accepts_any_slot() {
    let facts = vec![
        Fact::new("NodeType", ["MergeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "anyof"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
    ];
    let h = harness(facts, JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |req| Ok(req.args[0].clone()));
    });

    h.deliver(TokenBuilder::new(1_000_000).slot("whatever", "7").build()).await;
    h.deliver(TokenBuilder::new(1_000_100).slot("other", "8").build()).await;

    let values: Vec<&str> =
        h.publisher.tokens().iter().map(|t| t.attribute_value.as_str()).collect();
    assert_eq!(values, ["7", "8"]);
}

#[tokio::test]
async fn join_kind_with_single_binding_is_a_definition_fault() {
    let facts = vec![
        Fact::new("NodeType", ["JoinNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
    ];
    let h = harness(facts, JoinMode::Optimized, echo);

    h.deliver(TokenBuilder::new(1_000_000).slot("in", "42").build()).await;
    assert!(h.publisher.is_empty());
    assert!(h.rows.snapshot().is_empty());
}

#[tokio::test]
async fn expired_operation_kind_drops_tokens() {
    let facts = vec![
        Fact::new("NodeType", ["Expired"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
    ];
    let h = harness(facts, JoinMode::Optimized, echo);

    h.deliver(TokenBuilder::new(1_000_000).slot("in", "42").build()).await;
    assert!(h.publisher.is_empty());
}

#[tokio::test]
async fn invocation_failure_publishes_nothing() {
    let h = harness(edge_facts(), JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |_| Err(InvokeError::Failed("backend down".into())));
    });

    h.deliver(TokenBuilder::new(1_000_000).slot("in", "42").build()).await;

    assert!(h.publisher.is_empty());
    assert!(h.rows.snapshot().is_empty());
    let kinds = h.trace.kinds();
    assert!(!kinds.contains(&TraceKind::Exit));

    // no retry happened at this layer: exactly one invocation attempt
    h.deliver(TokenBuilder::new(1_000_001).slot("in", "43").build()).await;
    assert!(h.publisher.is_empty());
}

#[tokio::test]
async fn unbound_service_is_an_invocation_fault() {
    let h = harness(edge_facts(), JoinMode::Optimized, |_| {});
    h.deliver(TokenBuilder::new(1_000_000).slot("in", "42").build()).await;
    assert!(h.publisher.is_empty());
}

#[tokio::test]
async fn routing_fault_aborts_the_token_not_the_loop() {
    // publishes row with an ip channel that has no binding
    let facts = vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["Y", "true", "opY", "ip-missing", "direct", "9401", "null"]),
    ];
    let h = harness(facts, JoinMode::Optimized, echo);

    h.deliver(TokenBuilder::new(1_000_000).slot("in", "42").build()).await;
    assert!(h.publisher.is_empty());

    // the orchestrator is still alive
    h.deliver(TokenBuilder::new(1_000_001).slot("in", "43").build()).await;
    assert_eq!(h.orch.intake_depth(), 0);
}

#[tokio::test]
async fn duplicate_slot_delivery_is_idempotent() {
    let facts = vec![
        Fact::new("NodeType", ["JoinNode"]),
        Fact::new("canonicalBinding", ["opX", "joined", "a"]),
        Fact::new("canonicalBinding", ["opX", "joined", "b"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
    ];
    let h = harness(facts, JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |req| {
            assert_eq!(req.args, ["first", "9"]);
            Ok("j".to_string())
        });
    });

    h.deliver(TokenBuilder::new(1_000_001).slot("a", "first").build()).await;
    // at-least-once delivery: the same slot arrives again
    h.deliver(TokenBuilder::new(1_000_001).slot("a", "retry").build()).await;
    assert_eq!(h.orch.join_count(), 1);

    h.deliver(TokenBuilder::new(1_000_002).slot("b", "9").build()).await;
    assert_eq!(h.publisher.len(), 1);
    // only the distinct second branch was consumed
    let consumed = h
        .trace
        .snapshot()
        .iter()
        .filter(|r| r.event_type == TraceKind::JoinConsumed)
        .count();
    assert_eq!(consumed, 1);
}
