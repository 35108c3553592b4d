// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::TokenBuilder;
use proptest::prelude::*;

#[yare::parameterized(
    parent          = { 1_000_000, 0,  1_000_000 },
    first_child     = { 1_000_001, 1,  1_000_000 },
    last_child      = { 1_000_099, 99, 1_000_000 },
    other_instance  = { 2_000_042, 42, 2_000_000 },
)]
fn branch_and_join_key(id: i32, branch: i32, key: i32) {
    let id = TokenId(id);
    assert_eq!(id.branch(), branch);
    assert_eq!(id.join_key(), TokenId(key));
}

#[test]
fn parent_is_not_a_child() {
    assert!(!TokenId(1_000_000).is_child());
    assert!(TokenId(1_000_001).is_child());
}

#[test]
fn child_rejects_out_of_range_branches() {
    let parent = TokenId(2_000_000);
    assert_eq!(parent.child(0), None);
    assert_eq!(parent.child(100), None);
    assert_eq!(parent.child(-3), None);
    assert_eq!(parent.child(3), Some(TokenId(2_000_003)));
}

#[test]
fn child_of_child_shares_the_join_key() {
    let child = TokenId(1_000_007);
    assert_eq!(child.child(9), Some(TokenId(1_000_009)));
}

proptest! {
    // child - (child mod 100) = parent and child mod 100 in [1,99]
    #[test]
    fn child_genealogy_holds(base in 0..20_000_000i32, n in 1..=99i32) {
        let parent = TokenId(base - base.rem_euclid(100));
        let child = parent.child(n).unwrap();
        prop_assert_eq!(child.join_key(), parent);
        prop_assert!((1..=99).contains(&child.branch()));
    }
}

#[test]
fn forwarded_preserves_provenance_and_clears_arrival() {
    let token = TokenBuilder::new(1_000_001)
        .slot("in", "42")
        .workflow_start(555)
        .arrival(777)
        .build();
    let out = token.forwarded(
        TokenId(1_000_001),
        "SvcY".into(),
        "opY".into(),
        "out".into(),
        "result".to_string(),
    );
    assert_eq!(out.workflow_start_ms, 555);
    assert_eq!(out.event_arrival_ms, 0);
    assert_eq!(out.not_after, token.not_after);
    assert_eq!(out.service, "SvcY");
    assert_eq!(out.attribute_name, "out");
    assert_eq!(out.attribute_value, "result");
    assert_eq!(out.source_generator, token.source_generator);
}

#[test]
fn token_id_serializes_transparently() {
    let json = serde_json::to_string(&TokenId(1_000_042)).unwrap();
    assert_eq!(json, "1000042");
}
