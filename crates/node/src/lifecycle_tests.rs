// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::Config;
use serial_test::serial;
use weft_core::TokenBuilder;

fn write_edge_rules(root: &std::path::Path) {
    let path = weft_rules::rule_file_path(root, "11", "opX");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        path,
        "NodeType(\"TerminateNode\").\ncanonicalBinding(\"opX\", \"null\", \"in\").\n",
    )
    .unwrap();
}

fn test_config(dir: &std::path::Path) -> Config {
    Config::parse(&format!(
        r#"
rule_root = "{rules}"
state_dir = "{state}"
stats_interval_minutes = 60

[[place]]
service = "SvcX"
operation = "opX"
versions = ["11"]
service_channel = "ch-x"
rule_port = 9401
"#,
        rules = dir.join("rules").display(),
        state = dir.join("state").display(),
    ))
    .unwrap()
}

fn registry_for(config: &Config) -> Arc<ServiceRegistry> {
    let mut registry = ServiceRegistry::new();
    for place in &config.places {
        registry.register(place.service.as_str(), place.operation.as_str(), |req| {
            Ok(req.args.first().cloned().unwrap_or_default())
        });
    }
    Arc::new(registry)
}

#[tokio::test]
#[serial]
async fn node_starts_processes_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    write_edge_rules(&dir.path().join("rules"));
    let config = test_config(dir.path());
    let node = Node::start(&config, registry_for(&config)).await.unwrap();

    assert!(node.hub.is_bound("ch-x", 9401));
    let place = node.place("SvcX").unwrap().clone();
    place
        .seed(TokenBuilder::new(1_000_000).service("SvcX").slot("in", "42").build(), "SvcX.opX")
        .await
        .unwrap();

    // wait for the loop to drain the seed
    for _ in 0..100 {
        if place.intake_depth() == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    node.shutdown().await;

    let trace = weft_storage::TraceLog::read_all(&dir.path().join("state/trace.jsonl")).unwrap();
    assert!(trace.iter().any(|r| r.event_type == weft_core::TraceKind::Generated));
    assert!(trace.iter().any(|r| r.event_type == weft_core::TraceKind::Terminate));
}

#[tokio::test]
#[serial]
async fn second_node_on_the_same_state_dir_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_edge_rules(&dir.path().join("rules"));
    let config = test_config(dir.path());
    let node = Node::start(&config, registry_for(&config)).await.unwrap();

    match Node::start(&config, registry_for(&config)).await {
        Err(LifecycleError::LockFailed(_)) => {}
        other => panic!("expected LockFailed, got {:?}", other.map(|_| ())),
    }
    node.shutdown().await;
}
