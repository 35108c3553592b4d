// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned rule-base layout and loading.
//!
//! Layout on disk: `<root>/RuleFolder.<version>/<operation>/Service.ruleml`.

use crate::base::RuleBase;
use crate::parser::parse_facts;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rule base {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rule base parse error at line {line}: {snippet:?}")]
    Parse { line: usize, snippet: String },

    #[error("operation {operation} has no {relation} fact")]
    MissingRelation { operation: String, relation: &'static str },

    #[error("unknown node type {0:?}")]
    UnknownNodeType(String),

    #[error("invalid port {value:?} in {relation} row")]
    BadPort { relation: &'static str, value: String },
}

/// Path of one operation's rule file within a versioned folder.
pub fn rule_file_path(root: &Path, version: &str, operation: &str) -> PathBuf {
    root.join(format!("RuleFolder.{version}")).join(operation).join("Service.ruleml")
}

/// Read and parse one operation's rule base.
///
/// The content hash identifies the parsed knowledge in logs; callers
/// cache the result per version and never retry a failed load into the
/// cache.
pub fn load_rule_base(root: &Path, version: &str, operation: &str) -> Result<RuleBase, RulesError> {
    let path = rule_file_path(root, version, operation);
    let content = std::fs::read_to_string(&path)
        .map_err(|source| RulesError::Read { path: path.clone(), source })?;
    let facts = parse_facts(&content)?;
    let hash = format!("{:x}", Sha256::digest(content.as_bytes()));
    tracing::debug!(
        version,
        operation,
        facts = facts.len(),
        hash = short(&hash, 12),
        "rule base loaded"
    );
    Ok(RuleBase::new(facts, hash))
}

/// Returns a string slice truncated to at most `n` characters.
pub(crate) fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
