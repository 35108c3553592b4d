// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token envelope and token-id genealogy.
//!
//! A token carries one input slot toward one operation. Its 32-bit id
//! encodes genealogy in the low two decimal digits: branch 0 is a parent,
//! 1..=99 are fork children, and stripping the branch yields the join key
//! shared by every branch of one workflow instance.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Highest branch number a fork may assign to a child.
pub const MAX_BRANCH: i32 = 99;

/// 32-bit token identifier.
///
/// `branch()` and `join_key()` decompose the decimal layout; digits above
/// the branch pair encode rule-base version and workflow origin, which the
/// engine treats as opaque.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TokenId(pub i32);

impl TokenId {
    /// Branch number: 0 for a parent token, 1..=99 for a fork child.
    pub fn branch(self) -> i32 {
        self.0.rem_euclid(100)
    }

    /// Join key: the id shared by all branches of one workflow instance.
    pub fn join_key(self) -> TokenId {
        TokenId(self.0 - self.branch())
    }

    pub fn is_child(self) -> bool {
        self.branch() != 0
    }

    /// Id for fork child `n` of this token's instance.
    ///
    /// Returns `None` when `n` is outside 1..=99; the caller treats that as
    /// a routing-configuration fault rather than wrapping into a foreign
    /// join key.
    pub fn child(self, n: i32) -> Option<TokenId> {
        if (1..=MAX_BRANCH).contains(&n) {
            Some(TokenId(self.join_key().0 + n))
        } else {
            None
        }
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for TokenId {
    fn from(id: i32) -> Self {
        TokenId(id)
    }
}

/// Immutable message envelope delivered to a place.
///
/// Times are milliseconds since the Unix epoch. `event_arrival_ms` is
/// stamped by the transport on receipt and is 0 when the transport did not
/// capture it; the measurements writer falls back to the orchestrator's
/// own dequeue time in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    /// Selects a versioned rule set on disk.
    pub rule_version: SmolStr,
    /// Destination service identity.
    pub service: SmolStr,
    pub operation: SmolStr,
    /// Name of the input slot this token fills.
    pub attribute_name: SmolStr,
    pub attribute_value: String,
    /// Opaque join-attribute status marker, carried through unchanged.
    pub status: SmolStr,
    /// Absolute deadline for join completion.
    pub not_after: u64,
    pub workflow_start_ms: u64,
    pub event_arrival_ms: u64,
    pub generator_timestamp_ms: u64,
    pub source_generator: SmolStr,
    /// Monitoring request from the sender; ANDed with the place's own
    /// setting before any measurement row is written.
    pub monitor: bool,
}

impl Token {
    /// Derive the outgoing token for a routing step: same instance
    /// provenance, new id/destination/slot, arrival stamp cleared.
    pub fn forwarded(
        &self,
        id: TokenId,
        service: SmolStr,
        operation: SmolStr,
        attribute_name: SmolStr,
        attribute_value: String,
    ) -> Token {
        Token {
            id,
            rule_version: self.rule_version.clone(),
            service,
            operation,
            attribute_name,
            attribute_value,
            status: self.status.clone(),
            not_after: self.not_after,
            workflow_start_ms: self.workflow_start_ms,
            event_arrival_ms: 0,
            generator_timestamp_ms: self.generator_timestamp_ms,
            source_generator: self.source_generator.clone(),
            monitor: self.monitor,
        }
    }

    /// Compact form for log lines: `id@Service.op slot=name`.
    pub fn log_summary(&self) -> String {
        format!("{}@{}.{} slot={}", self.id, self.service, self.operation, self.attribute_name)
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
