// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::MemoryPublisher;
use weft_core::TokenBuilder;
use weft_rules::{Fact, OperationProfile};

fn base_of(facts: Vec<Fact>) -> RuleBase {
    RuleBase::new(facts, "test".to_string())
}

fn router() -> (Router<MemoryPublisher>, Arc<MemoryPublisher>) {
    let publisher = Arc::new(MemoryPublisher::new());
    (Router::new(PlaceId::new("SvcX", "opX"), publisher.clone()), publisher)
}

fn edge_facts() -> Vec<Fact> {
    vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcY", "true", "opY", "ch-main", "direct", "9401", "null"]),
    ]
}

fn profile_of(base: &RuleBase) -> OperationProfile {
    OperationProfile::derive(base, "opX").unwrap()
}

#[tokio::test]
async fn edge_publishes_first_matching_row_with_return_attribute() {
    let (router, publisher) = router();
    let base = base_of(edge_facts());
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let outcome = router.route(&base, &profile, &token, "42").await.unwrap();
    assert_eq!(outcome.exits.len(), 1);
    assert!(!outcome.terminated);
    let exit = &outcome.exits[0];
    assert_eq!(exit.to_place, PlaceId::new("SvcY", "opY"));
    assert_eq!(exit.destination, Destination::new("ch-main", 9401));
    assert_eq!(exit.token.attribute_name, "out");
    assert_eq!(exit.token.attribute_value, "42");
    assert_eq!(exit.token.id, token.id);
    assert_eq!(publisher.len(), 1);
}

#[tokio::test]
async fn self_feedback_uses_the_canonical_input_attribute() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["FeedFwdNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcX", "true", "opX", "ch-main", "direct", "9401", "null"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let outcome = router.route(&base, &profile, &token, "7").await.unwrap();
    assert_eq!(outcome.exits[0].token.attribute_name, "in");
}

#[tokio::test]
async fn active_service_overrides_the_publishes_channel() {
    let (router, _publisher) = router();
    let mut facts = edge_facts();
    facts.push(Fact::new("activeService", ["SvcY", "opY", "ch-live", "9777"]));
    let base = base_of(facts);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let outcome = router.route(&base, &profile, &token, "42").await.unwrap();
    assert_eq!(outcome.exits[0].destination, Destination::new("ch-live", 9777));
}

#[tokio::test]
async fn ip_channels_resolve_through_bound_channel() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcY", "true", "opY", "ip-east", "direct", "9401", "null"]),
        Fact::new("boundChannel", ["ip-east", "10.0.4.2"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let outcome = router.route(&base, &profile, &token, "x").await.unwrap();
    assert_eq!(outcome.exits[0].destination, Destination::new("10.0.4.2", 9401));
}

#[tokio::test]
async fn unbound_ip_channel_is_a_routing_error() {
    let (router, publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["EdgeNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcY", "true", "opY", "ip-gone", "direct", "9401", "null"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let fault = router.route(&base, &profile, &token, "x").await.unwrap_err();
    assert!(matches!(fault, TokenFault::RoutingConfig { .. }));
    assert!(publisher.is_empty());
}

#[tokio::test]
async fn xor_picks_exactly_one_branch_by_decision_value() {
    let (router, publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["XorNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcA", "false", "opA", "ch-a", "direct", "9001", "approve"]),
        Fact::new("publishes", ["SvcB", "false", "opB", "ch-b", "direct", "9002", "reject"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let outcome = router.route(&base, &profile, &token, "reject").await.unwrap();
    assert_eq!(outcome.exits.len(), 1);
    assert_eq!(outcome.exits[0].to_place, PlaceId::new("SvcB", "opB"));
    assert_eq!(outcome.exits[0].arc_value.as_deref(), Some("reject"));
    assert_eq!(publisher.len(), 1);
}

#[tokio::test]
async fn xor_ties_break_by_rule_row_order() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["XorNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcA", "false", "opA", "ch-a", "direct", "9001", "go"]),
        Fact::new("publishes", ["SvcB", "false", "opB", "ch-b", "direct", "9002", "go"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let outcome = router.route(&base, &profile, &token, "go").await.unwrap();
    assert_eq!(outcome.exits[0].to_place, PlaceId::new("SvcA", "opA"));
}

#[tokio::test]
async fn xor_null_decision_falls_back_to_condition() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["XorNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcA", "false", "opA", "ch-a", "direct", "9001", "approve"]),
        Fact::new("publishes", ["SvcB", "true", "opB", "ch-b", "direct", "9002", "null"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let outcome = router.route(&base, &profile, &token, "whatever").await.unwrap();
    assert_eq!(outcome.exits[0].to_place, PlaceId::new("SvcB", "opB"));
}

#[tokio::test]
async fn xor_without_matching_branch_is_a_routing_error() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["XorNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["SvcA", "false", "opA", "ch-a", "direct", "9001", "approve"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    assert!(matches!(
        router.route(&base, &profile, &token, "reject").await,
        Err(TokenFault::RoutingConfig { .. })
    ));
}

fn fork_facts() -> Vec<Fact> {
    vec![
        Fact::new("NodeType", ["ForkNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("meetsCondition", ["A", "opA", "always", "true"]),
        Fact::new("meetsCondition", ["B", "opB", "always", "true"]),
        Fact::new("meetsCondition", ["C", "opC", "always", "true"]),
        Fact::new("publishes", ["A", "true", "opA", "ch-a", "direct", "9001", "null"]),
        Fact::new("publishes", ["B", "true", "opB", "ch-b", "direct", "9002", "null"]),
        Fact::new("publishes", ["C", "true", "opC", "ch-c", "direct", "9003", "null"]),
    ]
}

#[tokio::test]
async fn fork_assigns_child_ids_in_arc_row_order() {
    let (router, publisher) = router();
    let base = base_of(fork_facts());
    let profile = profile_of(&base);
    let token = TokenBuilder::new(2_000_000).build();

    let outcome = router.route(&base, &profile, &token, "v").await.unwrap();
    assert_eq!(outcome.exits.len(), 3);
    let ids: Vec<i32> = outcome.exits.iter().map(|e| e.token.id.0).collect();
    assert_eq!(ids, [2_000_001, 2_000_002, 2_000_003]);
    assert!(outcome.exits.iter().all(|e| e.forked_child));
    let services: Vec<&str> =
        outcome.exits.iter().map(|e| e.to_place.service.as_str()).collect();
    assert_eq!(services, ["A", "B", "C"]);
    assert_eq!(publisher.len(), 3);
}

#[tokio::test]
async fn fork_children_keep_the_parents_join_key() {
    let (router, _publisher) = router();
    let base = base_of(fork_facts());
    let profile = profile_of(&base);
    let token = TokenBuilder::new(2_000_000).build();

    let outcome = router.route(&base, &profile, &token, "v").await.unwrap();
    for exit in &outcome.exits {
        assert_eq!(exit.token.id.join_key(), token.id);
        assert!((1..=99).contains(&exit.token.id.branch()));
    }
}

#[tokio::test]
async fn gateway_fork_directive_routes_to_listed_targets() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["GatewayNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["A", "true", "opA", "ch-a", "direct", "9001", "null"]),
        Fact::new("publishes", ["B", "true", "opB", "ch-b", "direct", "9002", "null"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(3_000_000).build();

    let outcome = router.route(&base, &profile, &token, "FORK:A.opA,B.opB").await.unwrap();
    let ids: Vec<i32> = outcome.exits.iter().map(|e| e.token.id.0).collect();
    assert_eq!(ids, [3_000_001, 3_000_002]);
    assert!(outcome.exits.iter().all(|e| e.forked_child));
}

#[tokio::test]
async fn gateway_edge_directive_routes_one_arc() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["GatewayNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("publishes", ["A", "true", "opA", "ch-a", "direct", "9001", "null"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(3_000_000).build();

    let outcome = router.route(&base, &profile, &token, "EDGE:A.opA").await.unwrap();
    assert_eq!(outcome.exits.len(), 1);
    assert_eq!(outcome.exits[0].token.id.0, 3_000_000);
    assert!(!outcome.exits[0].forked_child);
    assert_eq!(outcome.exits[0].arc_value.as_deref(), Some("EDGE:A.opA"));
}

#[tokio::test]
async fn malformed_gateway_directives_are_invocation_faults() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["GatewayNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(3_000_000).build();

    for directive in ["A.opA", "FORK:", "FORK:Anop"] {
        assert!(
            matches!(
                router.route(&base, &profile, &token, directive).await,
                Err(TokenFault::Invocation(_))
            ),
            "directive {directive:?} must be rejected"
        );
    }
}

#[tokio::test]
async fn terminate_publishes_nothing() {
    let (router, publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["TerminateNode"]),
        Fact::new("canonicalBinding", ["opX", "null", "in"]),
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(1_000_000).build();

    let outcome = router.route(&base, &profile, &token, "done").await.unwrap();
    assert!(outcome.terminated);
    assert!(outcome.exits.is_empty());
    assert!(publisher.is_empty());
}

#[tokio::test]
async fn fork_target_without_destination_is_a_routing_error() {
    let (router, _publisher) = router();
    let base = base_of(vec![
        Fact::new("NodeType", ["ForkNode"]),
        Fact::new("canonicalBinding", ["opX", "out", "in"]),
        Fact::new("meetsCondition", ["A", "opA", "always", "true"]),
        // no publishes row and no activeService for A.opA
    ]);
    let profile = profile_of(&base);
    let token = TokenBuilder::new(2_000_000).build();

    assert!(matches!(
        router.route(&base, &profile, &token, "v").await,
        Err(TokenFault::RoutingConfig { .. })
    ));
}
