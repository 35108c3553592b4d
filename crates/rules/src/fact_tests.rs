// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn var_terms_bind_in_pattern_order() {
    let fact = Fact::new("publishes", ["SvcY", "true", "opY"]);
    let pattern = Pattern::new("publishes", &["?svc", "?cond", "?op"]);
    let bindings = match_fact(&pattern, &fact).unwrap();
    let keys: Vec<&str> = bindings.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, ["svc", "cond", "op"]);
    assert_eq!(bindings.get("svc").unwrap(), "SvcY");
}

#[test]
fn const_terms_must_match() {
    let fact = Fact::new("canonicalBinding", ["opX", "out", "in"]);
    assert!(match_fact(&Pattern::new("canonicalBinding", &["opX", "?r", "?i"]), &fact).is_some());
    assert!(match_fact(&Pattern::new("canonicalBinding", &["opZ", "?r", "?i"]), &fact).is_none());
}

#[test]
fn arity_mismatch_never_matches() {
    let fact = Fact::new("Version", ["11"]);
    assert!(match_fact(&Pattern::new("Version", &["?v", "?extra"]), &fact).is_none());
}

#[test]
fn relation_name_must_match() {
    let fact = Fact::new("Version", ["11"]);
    assert!(match_fact(&Pattern::new("DecisionValue", &["?v"]), &fact).is_none());
}

#[test]
fn repeated_variable_requires_equal_args() {
    // canonicalBinding(op, r, r) is the self-feedback shape
    let feedback = Fact::new("canonicalBinding", ["opX", "r", "r"]);
    let plain = Fact::new("canonicalBinding", ["opX", "out", "in"]);
    let pattern = Pattern::new("canonicalBinding", &["opX", "?attr", "?attr"]);
    assert!(match_fact(&pattern, &feedback).is_some());
    assert!(match_fact(&pattern, &plain).is_none());
}

#[test]
fn term_from_str_distinguishes_vars() {
    assert_eq!(Term::from("?x"), Term::Var("x".into()));
    assert_eq!(Term::from("x"), Term::Const("x".into()));
}
