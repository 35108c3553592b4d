// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node classification as declared by the rule base's `NodeType` relation.

use serde::{Deserialize, Serialize};

/// How a place synchronizes its inputs and routes its outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Single input, single outgoing arc.
    Edge,
    /// Single result routed to exactly one of several branches.
    Xor,
    /// Synchronizes two or more input slots before firing.
    Join,
    /// Many incoming arcs, any one of which passes through.
    Merge,
    /// Merge variant fed by the branches of an upstream XOR.
    XorMerge,
    /// One input fanned out to parallel children.
    Fork,
    /// Service decides the outgoing shape at runtime (`FORK:`/`EDGE:`).
    Gateway,
    /// Terminal place; consumes the token.
    Terminate,
    /// Edge that feeds its own operation's input forward.
    FeedFwd,
    /// Edge that additionally forces measurement capture.
    Monitor,
    /// Operation retired from the current rule-base version.
    Expired,
}

impl NodeKind {
    /// Parse the rule-base spelling (`"EdgeNode"`, `"XorMergeNode"`, ...).
    pub fn from_fact(s: &str) -> Option<NodeKind> {
        Some(match s {
            "EdgeNode" => NodeKind::Edge,
            "XorNode" => NodeKind::Xor,
            "JoinNode" => NodeKind::Join,
            "MergeNode" => NodeKind::Merge,
            "XorMergeNode" => NodeKind::XorMerge,
            "ForkNode" => NodeKind::Fork,
            "GatewayNode" => NodeKind::Gateway,
            "TerminateNode" => NodeKind::Terminate,
            "FeedFwdNode" => NodeKind::FeedFwd,
            "MonitorNode" => NodeKind::Monitor,
            "Expired" => NodeKind::Expired,
            _ => return None,
        })
    }

    pub fn as_fact(&self) -> &'static str {
        match self {
            NodeKind::Edge => "EdgeNode",
            NodeKind::Xor => "XorNode",
            NodeKind::Join => "JoinNode",
            NodeKind::Merge => "MergeNode",
            NodeKind::XorMerge => "XorMergeNode",
            NodeKind::Fork => "ForkNode",
            NodeKind::Gateway => "GatewayNode",
            NodeKind::Terminate => "TerminateNode",
            NodeKind::FeedFwd => "FeedFwdNode",
            NodeKind::Monitor => "MonitorNode",
            NodeKind::Expired => "Expired",
        }
    }

    /// Join entries defer the ENTER record for child tokens until the
    /// join fires.
    pub fn is_join_entry(&self) -> bool {
        matches!(self, NodeKind::Join)
    }

    /// Kinds whose single input passes straight through to the service.
    pub fn single_input_ok(&self) -> bool {
        matches!(
            self,
            NodeKind::Edge
                | NodeKind::Terminate
                | NodeKind::Gateway
                | NodeKind::FeedFwd
                | NodeKind::Monitor
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_fact())
    }
}

#[cfg(test)]
#[path = "node_kind_tests.rs"]
mod tests;
