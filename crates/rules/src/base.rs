// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fact store a loaded rule base compiles into.

use crate::fact::{match_fact, Bindings, Fact, Pattern};
use smol_str::SmolStr;
use std::collections::HashMap;

/// Facts indexed by relation name, preserving file order within each
/// relation. File order is observable: routing rows tie-break by it.
#[derive(Debug, Clone, Default)]
pub struct RuleBase {
    relations: HashMap<SmolStr, Vec<Fact>>,
    /// Content hash of the source file, for logging and cache identity.
    content_hash: String,
}

impl RuleBase {
    pub fn new(facts: Vec<Fact>, content_hash: String) -> RuleBase {
        let mut relations: HashMap<SmolStr, Vec<Fact>> = HashMap::new();
        for fact in facts {
            relations.entry(fact.relation.clone()).or_default().push(fact);
        }
        RuleBase { relations, content_hash }
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// All solutions to the pattern, in fact order.
    pub fn query(&self, pattern: &Pattern) -> Vec<Bindings> {
        self.relations
            .get(&pattern.relation)
            .map(|facts| facts.iter().filter_map(|f| match_fact(pattern, f)).collect())
            .unwrap_or_default()
    }

    /// First solution, if any. For relations contracted to a single row.
    pub fn single(&self, pattern: &Pattern) -> Option<Bindings> {
        self.relations
            .get(&pattern.relation)?
            .iter()
            .find_map(|f| match_fact(pattern, f))
    }

    pub fn fact_count(&self) -> usize {
        self.relations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod tests;
