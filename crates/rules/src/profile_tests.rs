// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fact::Fact;

fn base_with(facts: Vec<Fact>) -> RuleBase {
    RuleBase::new(facts, "test".to_string())
}

fn edge_base() -> RuleBase {
    base_with(vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcY", "true", "opY", "ch-main", "direct", "9401", "null"]),
        Fact::new("meetsCondition", ["SvcY", "opY", "always", "true"]),
    ])
}

#[test]
fn derives_edge_profile() {
    let profile = OperationProfile::derive(&edge_base(), "opX").unwrap();
    assert_eq!(profile.node_kind, weft_core::NodeKind::Edge);
    assert_eq!(profile.inputs, ["in"]);
    assert_eq!(profile.return_attribute, "out");
    assert_eq!(profile.expected_arity(), 1);
    assert_eq!(profile.input_mode(), InputMode::Single);
    assert_eq!(profile.publishes.len(), 1);
    let row = &profile.publishes[0];
    assert_eq!(row.next_service, "SvcY");
    assert_eq!(row.next_operation, "opY");
    assert_eq!(row.port, 9401);
    assert_eq!(row.decision_value, "null");
}

#[test]
fn join_arity_comes_from_binding_rows_in_order() {
    let base = base_with(vec![
        Fact::new("NodeType", ["JoinNode"]),
        Fact::new("canonicalBinding", ["opJ", "joined", "a"]),
        Fact::new("canonicalBinding", ["opJ", "joined", "b"]),
        Fact::new("canonicalBinding", ["opJ", "joined", "c"]),
    ]);
    let profile = OperationProfile::derive(&base, "opJ").unwrap();
    assert_eq!(profile.inputs, ["a", "b", "c"]);
    assert_eq!(profile.expected_arity(), 3);
    assert_eq!(profile.input_mode(), InputMode::Synchronized);
}

#[yare::parameterized(
    zero  = { "null", InputMode::ZeroInput },
    anyof = { "anyof", InputMode::AnyOf },
    named = { "payload", InputMode::Single },
)]
fn single_binding_input_modes(slot: &str, expected: InputMode) {
    let base = base_with(vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", slot]),
    ]);
    let profile = OperationProfile::derive(&base, "opX").unwrap();
    assert_eq!(profile.input_mode(), expected);
}

#[test]
fn self_feedback_binding_re_derives_the_same_inputs() {
    // canonicalBinding(op, r, r): the published attribute is the
    // operation's own canonical input, so a republished token must map
    // onto the identical input collection.
    let base = base_with(vec![
        Fact::new("NodeType", ["FeedFwdNode"]),
        Fact::new("canonicalBinding", ["opLoop", "r", "r"]),
    ]);
    let first = OperationProfile::derive(&base, "opLoop").unwrap();
    assert_eq!(first.return_attribute, first.inputs[0]);
    let second = OperationProfile::derive(&base, "opLoop").unwrap();
    assert_eq!(first.inputs, second.inputs);
}

#[test]
fn fork_guards_preserve_rule_order() {
    let base = base_with(vec![
        Fact::new("NodeType", ["ForkNode"]),
        Fact::new("canonicalBinding", ["opF", "out", "in"]),
        Fact::new("meetsCondition", ["A", "opA", "always", "true"]),
        Fact::new("meetsCondition", ["B", "opB", "always", "true"]),
        Fact::new("meetsCondition", ["C", "opC", "always", "true"]),
    ]);
    let profile = OperationProfile::derive(&base, "opF").unwrap();
    let targets: Vec<&str> = profile.guards.iter().map(|g| g.service.as_str()).collect();
    assert_eq!(targets, ["A", "B", "C"]);
}

#[test]
fn missing_node_type_is_an_error() {
    let base = base_with(vec![Fact::new("canonicalBinding", ["opX", "out", "in"])]);
    assert!(matches!(
        OperationProfile::derive(&base, "opX"),
        Err(RulesError::MissingRelation { relation: "NodeType", .. })
    ));
}

#[test]
fn missing_binding_is_an_error() {
    let base = base_with(vec![Fact::new("NodeType", ["EdgeNode"])]);
    assert!(matches!(
        OperationProfile::derive(&base, "opX"),
        Err(RulesError::MissingRelation { relation: "canonicalBinding", .. })
    ));
}

#[test]
fn unknown_node_type_is_an_error() {
    let base = base_with(vec![
        Fact::new("NodeType", ["WarpNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
    ]);
    assert!(matches!(
        OperationProfile::derive(&base, "opX"),
        Err(RulesError::UnknownNodeType(_))
    ));
}

#[test]
fn unparsable_port_is_an_error() {
    let base = base_with(vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcY", "true", "opY", "ch", "direct", "no-port", "null"]),
    ]);
    assert!(matches!(
        OperationProfile::derive(&base, "opX"),
        Err(RulesError::BadPort { relation: "publishes", .. })
    ));
}

#[test]
fn active_service_override_resolves() {
    let base = base_with(vec![Fact::new("activeService", ["SvcY", "opY", "ch-live", "9777"])]);
    let (channel, port) = active_service(&base, "SvcY", "opY").unwrap().unwrap();
    assert_eq!(channel, "ch-live");
    assert_eq!(port, 9777);
    assert!(active_service(&base, "SvcZ", "opZ").unwrap().is_none());
}

#[test]
fn bound_channel_resolves_ip_names() {
    let base = base_with(vec![Fact::new("boundChannel", ["ip-east", "10.0.4.2"])]);
    assert_eq!(bound_channel(&base, "ip-east").unwrap(), "10.0.4.2");
    assert_eq!(bound_channel(&base, "ip-west"), None);
}
