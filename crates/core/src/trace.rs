// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instrumentation records emitted by the orchestrator.
//!
//! One record per marking-relevant occurrence. The animator and marking
//! analysis replay these, so field names are part of the external contract
//! and serialize in camelCase exactly as consumers expect them.

use crate::token::TokenId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Kind of an instrumentation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceKind {
    /// A fresh workflow instance was injected at a transition.
    Generated,
    /// Token arrived in the place's buffer.
    Buffered,
    /// Token entered the place (deferred to join firing for join children).
    Enter,
    /// Token left along one outgoing arc.
    Exit,
    /// Parent spawned one fork child.
    Fork,
    /// Non-surviving join participant consumed at firing.
    JoinConsumed,
    /// Token consumed at a terminal place.
    Terminate,
}

impl TraceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceKind::Generated => "GENERATED",
            TraceKind::Buffered => "BUFFERED",
            TraceKind::Enter => "ENTER",
            TraceKind::Exit => "EXIT",
            TraceKind::Fork => "FORK",
            TraceKind::JoinConsumed => "JOIN_CONSUMED",
            TraceKind::Terminate => "TERMINATE",
        }
    }
}

/// One instrumentation occurrence.
///
/// `marking` is the instantaneous token count at the place (`buffer + 1`
/// at dequeue); `to_place` is set on EXIT, `transition_id` on GENERATED
/// and FORK, `arc_value` on XOR/Gateway EXITs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub timestamp: u64,
    pub token_id: TokenId,
    pub place_or_transition: String,
    pub event_type: TraceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_id: Option<String>,
    pub marking: u32,
    pub buffer: u32,
    pub workflow_start_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arc_value: Option<String>,
    #[serde(default, skip_serializing_if = "SmolStr::is_empty")]
    pub source_event_generator: SmolStr,
    #[serde(default)]
    pub event_generator_timestamp: u64,
}

impl TraceRecord {
    /// Compact form for log lines.
    pub fn log_summary(&self) -> String {
        format!(
            "{} token={} at={} marking={}",
            self.event_type.as_str(),
            self.token_id,
            self.place_or_transition,
            self.marking
        )
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
