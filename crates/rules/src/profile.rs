// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed view of one operation's rule base.
//!
//! Everything the orchestrator needs per `(service, operation)` is
//! derived here through the same query contract external rule engines
//! implement: node kind, canonical input slots, return attribute,
//! routing rows, and fork guards.

use crate::base::RuleBase;
use crate::fact::Pattern;
use crate::loader::RulesError;
use smol_str::SmolStr;
use weft_core::NodeKind;

/// One `publishes` routing row, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRow {
    pub next_service: SmolStr,
    pub next_operation: SmolStr,
    pub condition: SmolStr,
    pub channel: SmolStr,
    pub link: SmolStr,
    pub port: u16,
    pub decision_value: SmolStr,
}

/// One `meetsCondition` fork guard row, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRow {
    pub service: SmolStr,
    pub operation: SmolStr,
    pub guard_type: SmolStr,
    pub guard_value: SmolStr,
}

/// Input requirement classification for the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Canonical input is the literal `"null"`: invoke with the trigger.
    ZeroInput,
    /// Canonical input is the `"anyof"` marker: any arriving slot is
    /// accepted unconditionally.
    AnyOf,
    /// Exactly one named slot; the arriving attribute must match it.
    Single,
    /// Two or more slots synchronize through the join coordinator.
    Synchronized,
}

/// Derived per-operation facts the orchestrator dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationProfile {
    pub node_kind: NodeKind,
    /// Canonical input slot names, in rule order. Size is the join's
    /// expected arity.
    pub inputs: Vec<SmolStr>,
    /// Attribute this operation emits; may be the literal `"null"`.
    pub return_attribute: SmolStr,
    pub publishes: Vec<PublishRow>,
    pub guards: Vec<GuardRow>,
}

impl OperationProfile {
    pub fn derive(base: &RuleBase, operation: &str) -> Result<OperationProfile, RulesError> {
        let kind_row = base
            .single(&Pattern::new("NodeType", &["?nodeType"]))
            .ok_or_else(|| missing(operation, "NodeType"))?;
        let kind_name = kind_row.get("nodeType").map(SmolStr::as_str).unwrap_or_default();
        let node_kind = NodeKind::from_fact(kind_name)
            .ok_or_else(|| RulesError::UnknownNodeType(kind_name.to_string()))?;

        let binding_rows =
            base.query(&Pattern::new("canonicalBinding", &[operation, "?returnAttr", "?input"]));
        if binding_rows.is_empty() {
            return Err(missing(operation, "canonicalBinding"));
        }
        let return_attribute = binding_rows[0]
            .get("returnAttr")
            .cloned()
            .unwrap_or_else(|| SmolStr::new("null"));
        let mut inputs: Vec<SmolStr> = Vec::with_capacity(binding_rows.len());
        for row in &binding_rows {
            if let Some(slot) = row.get("input") {
                if !inputs.contains(slot) {
                    inputs.push(slot.clone());
                }
            }
        }

        let publishes = base
            .query(&Pattern::new(
                "publishes",
                &["?nextSvc", "?cond", "?nextOp", "?channel", "?link", "?port", "?decisionValue"],
            ))
            .into_iter()
            .map(|row| {
                let port_str = row.get("port").map(SmolStr::as_str).unwrap_or_default();
                let port = port_str.parse::<u16>().map_err(|_| RulesError::BadPort {
                    relation: "publishes",
                    value: port_str.to_string(),
                })?;
                Ok(PublishRow {
                    next_service: get(&row, "nextSvc"),
                    next_operation: get(&row, "nextOp"),
                    condition: get(&row, "cond"),
                    channel: get(&row, "channel"),
                    link: get(&row, "link"),
                    port,
                    decision_value: get(&row, "decisionValue"),
                })
            })
            .collect::<Result<Vec<_>, RulesError>>()?;

        let guards = base
            .query(&Pattern::new("meetsCondition", &["?svc", "?op", "?guardType", "?guardValue"]))
            .into_iter()
            .map(|row| GuardRow {
                service: get(&row, "svc"),
                operation: get(&row, "op"),
                guard_type: get(&row, "guardType"),
                guard_value: get(&row, "guardValue"),
            })
            .collect();

        Ok(OperationProfile { node_kind, inputs, return_attribute, publishes, guards })
    }

    pub fn expected_arity(&self) -> usize {
        self.inputs.len()
    }

    pub fn input_mode(&self) -> InputMode {
        if self.inputs.len() >= 2 {
            return InputMode::Synchronized;
        }
        match self.inputs.first().map(SmolStr::as_str) {
            Some("null") | None => InputMode::ZeroInput,
            Some("anyof") => InputMode::AnyOf,
            Some(_) => InputMode::Single,
        }
    }
}

/// Runtime routing override: `activeService(svc, op, ?channelId, ?port)`.
pub fn active_service(
    base: &RuleBase,
    service: &str,
    operation: &str,
) -> Result<Option<(SmolStr, u16)>, RulesError> {
    let pattern = Pattern::new("activeService", &[service, operation, "?channelId", "?port"]);
    let row = match base.single(&pattern) {
        Some(row) => row,
        None => return Ok(None),
    };
    let channel = get(&row, "channelId");
    let port_str = row.get("port").map(SmolStr::as_str).unwrap_or_default();
    let port = port_str.parse::<u16>().map_err(|_| RulesError::BadPort {
        relation: "activeService",
        value: port_str.to_string(),
    })?;
    Ok(Some((channel, port)))
}

/// Channel-name to address resolution: `boundChannel(channelId, ?address)`.
pub fn bound_channel(base: &RuleBase, channel_id: &str) -> Option<SmolStr> {
    base.single(&Pattern::new("boundChannel", &[channel_id, "?address"]))
        .and_then(|row| row.get("address").cloned())
}

fn get(row: &crate::fact::Bindings, var: &str) -> SmolStr {
    row.get(var).cloned().unwrap_or_default()
}

fn missing(operation: &str, relation: &'static str) -> RulesError {
    RulesError::MissingRelation { operation: operation.to_string(), relation }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
