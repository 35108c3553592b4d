// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Address/version filters and rule-cache behavior.

use super::*;

fn edge_facts() -> Vec<Fact> {
    vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
    ]
}

#[tokio::test]
async fn address_mismatch_drops_without_any_records() {
    let h = harness(edge_facts(), JoinMode::Optimized, echo);

    h.deliver(TokenBuilder::new(1_000_000).service("SvcOther").slot("in", "42").build()).await;

    assert!(h.publisher.is_empty());
    assert!(h.trace.snapshot().is_empty());
    assert!(h.rows.snapshot().is_empty());
}

#[tokio::test]
async fn unregistered_version_is_rejected_before_instrumentation() {
    let h = harness(edge_facts(), JoinMode::Optimized, echo);

    h.deliver(TokenBuilder::new(1_000_000).rule_version("99").slot("in", "42").build()).await;

    assert!(h.publisher.is_empty());
    assert!(h.trace.snapshot().is_empty());
}

#[tokio::test]
async fn rule_load_failure_skips_the_token_without_poisoning() {
    // registered version "11" but nothing preloaded and no rule dir
    let h = bare_harness(JoinMode::Optimized, echo);

    h.deliver(TokenBuilder::new(1_000_000).slot("in", "42").build()).await;
    assert!(h.publisher.is_empty());
    assert!(h.trace.snapshot().is_empty());

    // a later preload heals the place: the failed load poisoned nothing
    h.orch.preload_rules("11", RuleBase::new(edge_facts(), "late".to_string()));
    h.deliver(TokenBuilder::new(1_000_001).slot("in", "42").build()).await;
    assert_eq!(h.publisher.len(), 1);
}

#[tokio::test]
async fn rules_load_from_disk_and_cache_per_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = weft_rules::rule_file_path(dir.path(), "11", "opX");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        "NodeType(\"EdgeNode\").\n\
         canonicalBinding(\"opX\", \"out\", \"in\").\n\
         publishes(\"Y\", \"true\", \"opY\", \"ch-y\", \"direct\", \"9401\", \"null\").\n",
    )
    .unwrap();

    let publisher = Arc::new(crate::test_support::MemoryPublisher::new());
    let trace = Arc::new(crate::instrument::MemorySink::new());
    let rows = Arc::new(crate::measure::MemoryMeasurements::new());
    let orch = Orchestrator::new(
        OrchestratorConfig {
            place: PlaceId::new("SvcX", "opX"),
            rule_root: dir.path().to_path_buf(),
            registered_versions: vec![SmolStr::new("11")],
            join_mode: JoinMode::Optimized,
            monitor_incoming_events: true,
            intake_capacity: 64,
            backoff: BackoffPolicy::default(),
        },
        Arc::new({
            let mut r = ServiceRegistry::new();
            echo(&mut r);
            r
        }),
        publisher.clone(),
        trace,
        rows,
        weft_core::FakeClock::at(1_000_000),
    );

    orch.sender().send(TokenBuilder::new(1_000_000).slot("in", "1").build()).await.unwrap();
    assert!(orch.step().await);
    assert_eq!(publisher.len(), 1);

    // second token is served from the cache even after the file is gone
    std::fs::remove_file(&path).unwrap();
    orch.sender().send(TokenBuilder::new(1_000_001).slot("in", "2").build()).await.unwrap();
    assert!(orch.step().await);
    assert_eq!(publisher.len(), 2);
}

#[tokio::test]
async fn shutdown_clears_join_state_and_is_idempotent() {
    let facts = vec![
        Fact::new("NodeType", ["JoinNode"]),
        Fact::new("canonicalBinding", ["opX", "joined", "a"]),
        Fact::new("canonicalBinding", ["opX", "joined", "b"]),
        Fact::new("publishes", ["Y", "true", "opY", "ch-y", "direct", "9401", "null"]),
    ];
    let h = harness(facts, JoinMode::Optimized, echo);
    h.deliver(TokenBuilder::new(1_000_001).slot("a", "1").build()).await;
    assert_eq!(h.orch.join_count(), 1);

    h.orch.shutdown();
    h.orch.shutdown();
    h.orch.run().await;
    assert_eq!(h.orch.join_count(), 0);
    assert!(!h.orch.step().await);
}
