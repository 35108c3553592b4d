// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end walks of the documented scenarios against one place.

use super::*;
use crate::transport::Destination;
use weft_core::TraceKind;

fn edge_facts() -> Vec<Fact> {
    vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
        Fact::new("meetsCondition", ["Y", "opY", "always", "true"]),
    ]
}

#[tokio::test]
async fn edge_pass_through() {
    let h = harness(edge_facts(), JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |req| {
            assert_eq!(req.args, ["42"]);
            Ok(req.args[0].clone())
        });
    });

    h.deliver(TokenBuilder::new(1_000_000).slot("in", "42").build()).await;

    let published = h.publisher.snapshot();
    assert_eq!(published.len(), 1);
    let (dest, out) = &published[0];
    assert_eq!(dest, &Destination::new("ch-y", 9401));
    assert_eq!(out.service, "Y");
    assert_eq!(out.operation, "opY");
    assert_eq!(out.attribute_name, "out");
    assert_eq!(out.attribute_value, "42");

    assert_eq!(
        h.trace.kinds(),
        [TraceKind::Buffered, TraceKind::Enter, TraceKind::Exit]
    );
    let rows = h.rows.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sequence_id, 1_000_000);
}

fn join_facts() -> Vec<Fact> {
    vec![
        Fact::new("NodeType", ["JoinNode"]),
        Fact::new("canonicalBinding", ["opX", "joined", "a"]),
        Fact::new("canonicalBinding", ["opX", "joined", "b"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
    ]
}

#[tokio::test]
async fn two_way_join_optimized() {
    let h = harness(join_facts(), JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |req| {
            assert_eq!(req.args, ["7", "9"]);
            Ok("joined".to_string())
        });
    });

    h.deliver(TokenBuilder::new(1_000_001).slot("a", "7").build()).await;
    assert!(h.publisher.is_empty());
    // child token at a join entry: ENTER is deferred
    assert_eq!(h.trace.kinds(), [TraceKind::Buffered]);

    h.deliver(TokenBuilder::new(1_000_002).slot("b", "9").build()).await;

    let published = h.publisher.tokens();
    assert_eq!(published.len(), 1);
    // the continuing token carries the surviving (lowest) branch id
    assert_eq!(published[0].id.0, 1_000_001);

    let records = h.trace.snapshot();
    let consumed: Vec<i32> = records
        .iter()
        .filter(|r| r.event_type == TraceKind::JoinConsumed)
        .map(|r| r.token_id.0)
        .collect();
    assert_eq!(consumed, [1_000_002]);
    let entered: Vec<i32> = records
        .iter()
        .filter(|r| r.event_type == TraceKind::Enter)
        .map(|r| r.token_id.0)
        .collect();
    assert_eq!(entered, [1_000_001]);
    assert_eq!(h.orch.join_count(), 0);
}

#[tokio::test]
async fn join_survivor_workflow_start_flows_into_measurements() {
    let h = harness(join_facts(), JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |_| Ok("j".to_string()));
    });

    h.deliver(TokenBuilder::new(1_000_001).slot("a", "7").workflow_start(111).build()).await;
    h.deliver(TokenBuilder::new(1_000_002).slot("b", "9").workflow_start(999).build()).await;

    let rows = h.rows.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].workflow_start_time, 111);
    assert_eq!(h.publisher.tokens()[0].workflow_start_ms, 111);
}

#[tokio::test]
async fn continuing_token_carries_survivor_provenance() {
    let h = harness(join_facts(), JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |_| Ok("j".to_string()));
    });

    h.deliver(
        TokenBuilder::new(1_000_001).slot("a", "7").generator("gen-a").arrival(1_000_050).build(),
    )
    .await;
    h.deliver(
        TokenBuilder::new(1_000_002).slot("b", "9").generator("gen-b").arrival(1_000_060).build(),
    )
    .await;

    // the published token is the surviving branch's, not the trigger's
    let published = h.publisher.tokens();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id.0, 1_000_001);
    assert_eq!(published[0].source_generator, "gen-a");

    let records = h.trace.snapshot();
    let enter = records.iter().find(|r| r.event_type == TraceKind::Enter).unwrap();
    assert_eq!(enter.source_event_generator, "gen-a");
    let consumed = records.iter().find(|r| r.event_type == TraceKind::JoinConsumed).unwrap();
    assert_eq!(consumed.source_event_generator, "gen-b");

    // the row observes the survivor's transport arrival stamp
    let rows = h.rows.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].arrival_time, 1_000_050);
}

#[tokio::test]
async fn sequential_fired_keys_use_their_own_rule_versions() {
    let v12_facts = vec![
        Fact::new("NodeType", ["JoinNode"]),
        Fact::new("canonicalBinding", ["opX", "joined", "a"]),
        Fact::new("canonicalBinding", ["opX", "joined", "b"]),
        Fact::new("publishes", ["Z", "true", "opZ", "ch-z", "direct", "9501", "null"]),
    ];
    let h = harness(join_facts(), JoinMode::Sequential, |registry| {
        registry.register("SvcX", "opX", |_| Ok("j".to_string()));
    });
    h.orch.preload_rules("12", RuleBase::new(v12_facts, "v12".to_string()));

    // the lower key stays incomplete under version 11 while the higher
    // key completes under version 12
    h.deliver(TokenBuilder::new(1_000_101).slot("a", "1").build()).await;
    h.deliver(TokenBuilder::new(1_000_201).slot("a", "2").rule_version("12").build()).await;
    h.deliver(TokenBuilder::new(1_000_202).slot("b", "3").rule_version("12").build()).await;
    assert!(h.publisher.is_empty());

    // completing the lower key fires both joins in one scan; each
    // continuing token routes through its own version's rule base
    h.deliver(TokenBuilder::new(1_000_102).slot("b", "4").build()).await;

    let published = h.publisher.snapshot();
    assert_eq!(published.len(), 2);
    let (first_dest, first) = &published[0];
    assert_eq!(first.id.0, 1_000_101);
    assert_eq!(first.rule_version, "11");
    assert_eq!(first.service, "Y");
    assert_eq!(first_dest, &Destination::new("ch-y", 9401));
    let (second_dest, second) = &published[1];
    assert_eq!(second.id.0, 1_000_201);
    assert_eq!(second.rule_version, "12");
    assert_eq!(second.service, "Z");
    assert_eq!(second_dest, &Destination::new("ch-z", 9501));
}

#[tokio::test]
async fn sequential_mode_blocks_higher_keys() {
    let h = harness(join_facts(), JoinMode::Sequential, |registry| {
        registry.register("SvcX", "opX", |_| Ok("j".to_string()));
    });

    // key 1000100 stays incomplete; key 1000200 completes behind it
    h.deliver(TokenBuilder::new(1_000_101).slot("a", "1").build()).await;
    h.deliver(TokenBuilder::new(1_000_201).slot("a", "2").build()).await;
    h.deliver(TokenBuilder::new(1_000_202).slot("b", "3").build()).await;

    assert!(h.publisher.is_empty());
    assert_eq!(h.orch.join_count(), 2);
    assert!(h.rows.snapshot().is_empty());
}

#[tokio::test]
async fn expired_join_never_invokes() {
    let h = harness(join_facts(), JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |_| {
            panic!("service must not run for an expired join");
        });
    });

    // deadline already in the past at delivery
    h.deliver(TokenBuilder::new(1_000_001).slot("a", "7").not_after(999_999).build()).await;

    assert!(h.publisher.is_empty());
    assert_eq!(h.orch.join_count(), 0);
    let kinds = h.trace.kinds();
    assert!(!kinds.contains(&TraceKind::Exit));
    assert!(h.rows.snapshot().is_empty());
}

#[tokio::test]
async fn fork_of_three() {
    let facts = vec![
        Fact::new("NodeType", ["ForkNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("meetsCondition", ["A", "opA", "always", "true"]),
        Fact::new("meetsCondition", ["B", "opB", "always", "true"]),
        Fact::new("meetsCondition", ["C", "opC", "always", "true"]),
        Fact::new("publishes", ["A", "true", "opA", "ch-a", "direct", "9001", "null"]),
        Fact::new("publishes", ["B", "true", "opB", "ch-b", "direct", "9002", "null"]),
        Fact::new("publishes", ["C", "true", "opC", "ch-c", "direct", "9003", "null"]),
    ];
    let h = harness(facts, JoinMode::Optimized, echo);

    h.deliver(TokenBuilder::new(2_000_000).slot("in", "seed").build()).await;

    let ids: Vec<i32> = h.publisher.tokens().iter().map(|t| t.id.0).collect();
    assert_eq!(ids, [2_000_001, 2_000_002, 2_000_003]);

    let records = h.trace.snapshot();
    let forks: Vec<(i32, Option<String>)> = records
        .iter()
        .filter(|r| r.event_type == TraceKind::Fork)
        .map(|r| (r.token_id.0, r.transition_id.clone()))
        .collect();
    assert_eq!(forks.len(), 3);
    for (child, parent) in &forks {
        assert_eq!(child - child.rem_euclid(100), 2_000_000);
        assert_eq!(parent.as_deref(), Some("2000000"));
    }
    let exits = records.iter().filter(|r| r.event_type == TraceKind::Exit).count();
    assert_eq!(exits, 3);
}

#[tokio::test]
async fn gateway_dynamic_fork() {
    let facts = vec![
        Fact::new("NodeType", ["GatewayNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["A", "true", "opA", "ch-a", "direct", "9001", "null"]),
        Fact::new("publishes", ["B", "true", "opB", "ch-b", "direct", "9002", "null"]),
    ];
    let h = harness(facts, JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |_| Ok("FORK:A.opA,B.opB".to_string()));
    });

    h.deliver(TokenBuilder::new(3_000_000).slot("in", "go").build()).await;

    let published = h.publisher.tokens();
    let ids: Vec<i32> = published.iter().map(|t| t.id.0).collect();
    assert_eq!(ids, [3_000_001, 3_000_002]);
    assert_eq!(published[0].attribute_name, "out");
    assert_eq!(published[1].attribute_name, "out");
    let targets: Vec<String> =
        published.iter().map(|t| format!("{}.{}", t.service, t.operation)).collect();
    assert_eq!(targets, ["A.opA", "B.opB"]);
}

#[tokio::test]
async fn terminate_consumes_the_token() {
    let facts = vec![
        Fact::new("NodeType", ["TerminateNode"]),
        Fact::new("canonicalBinding", ["opX", "null", "in"]),
    ];
    let h = harness(facts, JoinMode::Optimized, echo);

    h.deliver(TokenBuilder::new(1_000_000).slot("in", "final").build()).await;

    assert!(h.publisher.is_empty());
    assert_eq!(
        h.trace.kinds(),
        [TraceKind::Buffered, TraceKind::Enter, TraceKind::Terminate]
    );
}

#[tokio::test]
async fn zero_input_operation_invokes_with_trigger() {
    let facts = vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "null"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
    ];
    let h = harness(facts, JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |req| {
            assert_eq!(req.args, ["tick"]);
            Ok("pulse".to_string())
        });
    });

    h.deliver(TokenBuilder::new(1_000_000).slot("trigger", "tick").build()).await;
    assert_eq!(h.publisher.tokens()[0].attribute_value, "pulse");
}

#[tokio::test]
async fn seed_records_generated_and_enqueues() {
    let h = harness(edge_facts(), JoinMode::Optimized, echo);
    let token = TokenBuilder::new(1_000_000).slot("in", "42").build();
    h.orch.seed(token, "SvcX.opX").await.unwrap();
    assert_eq!(h.orch.intake_depth(), 1);
    let kinds = h.trace.kinds();
    assert_eq!(kinds, [TraceKind::Generated]);
    assert!(h.orch.step().await);
    assert!(h.trace.kinds().contains(&TraceKind::Exit));
}

#[tokio::test]
async fn xor_routes_exactly_one_branch() {
    let facts = vec![
        Fact::new("NodeType", ["XorNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["A", "false", "opA", "ch-a", "direct", "9001", "approve"]),
        Fact::new("publishes", ["B", "false", "opB", "ch-b", "direct", "9002", "reject"]),
    ];
    let h = harness(facts, JoinMode::Optimized, |registry| {
        registry.register("SvcX", "opX", |_| Ok("approve".to_string()));
    });

    h.deliver(TokenBuilder::new(1_000_000).slot("in", "x").build()).await;

    let published = h.publisher.tokens();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].service, "A");
    let records = h.trace.snapshot();
    let exit = records.iter().find(|r| r.event_type == TraceKind::Exit).unwrap();
    assert_eq!(exit.arc_value.as_deref(), Some("approve"));
    assert_eq!(exit.to_place.as_deref(), Some("A.opA"));
}
