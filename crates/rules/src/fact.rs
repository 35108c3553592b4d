// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ground facts, query patterns, and solution rows.

use indexmap::IndexMap;
use smol_str::SmolStr;

/// One ground fact: a relation name applied to constant arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub relation: SmolStr,
    pub args: Vec<SmolStr>,
}

impl Fact {
    pub fn new<I, S>(relation: &str, args: I) -> Fact
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Fact {
            relation: SmolStr::new(relation),
            args: args.into_iter().map(|a| SmolStr::new(a.as_ref())).collect(),
        }
    }
}

/// A term in a query pattern: either a constant to match or a variable
/// to bind. The `?` sigil marks variables in the textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Const(SmolStr),
    Var(SmolStr),
}

impl From<&str> for Term {
    fn from(s: &str) -> Term {
        match s.strip_prefix('?') {
            Some(name) => Term::Var(SmolStr::new(name)),
            None => Term::Const(SmolStr::new(s)),
        }
    }
}

/// A single-relation conjunctive pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub relation: SmolStr,
    pub terms: Vec<Term>,
}

impl Pattern {
    /// Build from textual terms; `?name` is a variable, anything else a
    /// constant. `Pattern::new("publishes", &["?svc", "?cond", "opB"])`.
    pub fn new(relation: &str, terms: &[&str]) -> Pattern {
        Pattern {
            relation: SmolStr::new(relation),
            terms: terms.iter().map(|t| Term::from(*t)).collect(),
        }
    }
}

/// One solution row: variable name (without the sigil) to bound value,
/// in pattern order.
pub type Bindings = IndexMap<SmolStr, SmolStr>;

/// Match a pattern against one fact, producing the bindings on success.
///
/// A variable repeated within the pattern must bind consistently.
pub(crate) fn match_fact(pattern: &Pattern, fact: &Fact) -> Option<Bindings> {
    if pattern.relation != fact.relation || pattern.terms.len() != fact.args.len() {
        return None;
    }
    let mut bindings = Bindings::new();
    for (term, arg) in pattern.terms.iter().zip(&fact.args) {
        match term {
            Term::Const(expected) => {
                if expected != arg {
                    return None;
                }
            }
            Term::Var(name) => match bindings.get(name) {
                Some(bound) if bound != arg => return None,
                Some(_) => {}
                None => {
                    bindings.insert(name.clone(), arg.clone());
                }
            },
        }
    }
    Some(bindings)
}

#[cfg(test)]
#[path = "fact_tests.rs"]
mod tests;
