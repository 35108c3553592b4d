// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Join coordination: partial-input state per join key, firing policy,
//! and survivor selection.
//!
//! A join key is `tokenId - (tokenId mod 100)`. State is created lazily
//! on the first slot for a key and destroyed on firing, expiry, or
//! shutdown. Per-key writes serialize behind one lock; firing observes a
//! point-in-time snapshot.

use crate::error::TokenFault;
use indexmap::IndexMap;
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::BTreeMap;
use weft_core::{Clock, Token, TokenId};

/// Firing policy, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Any complete join fires, scanned in ascending key order.
    Optimized,
    /// Only the lowest key may fire; complete higher keys wait behind it.
    Sequential,
}

#[derive(Debug)]
struct JoinState {
    /// Canonical slot names; length is the expected arity, immutable
    /// once set for a key.
    slots: Vec<SmolStr>,
    /// First value per slot wins; later writes are ignored.
    inputs: IndexMap<SmolStr, String>,
    /// Latest `notAfter` observed for this key.
    deadline_ms: u64,
    /// Each branch that filled a slot, as it arrived. Full tokens are
    /// kept so the survivor's provenance continues downstream.
    contributions: Vec<Token>,
}

impl JoinState {
    fn is_complete(&self) -> bool {
        self.inputs.len() >= self.slots.len()
    }
}

/// A completed join ready to invoke.
#[derive(Debug)]
pub struct FiredJoin {
    pub key: TokenId,
    /// The contribution with the lowest branch id. This token becomes
    /// the continuing token: its id, workflow start, rule version, and
    /// generator provenance all flow downstream unchanged.
    pub surviving: Token,
    pub consumed: Vec<Token>,
    /// Input tuple in canonical slot order.
    pub args: Vec<String>,
}

/// Result of one post-arrival scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub fired: Vec<FiredJoin>,
    /// `(ready key, blocking key)` pairs in SEQUENTIAL mode.
    pub blocked: Vec<(TokenId, TokenId)>,
    pub expired: Vec<TokenId>,
}

/// Outcome of recording one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    Added,
    /// The slot already held a value; nothing changed.
    Duplicate,
}

pub struct JoinCoordinator<C: Clock> {
    mode: JoinMode,
    clock: C,
    states: Mutex<BTreeMap<i32, JoinState>>,
}

impl<C: Clock> JoinCoordinator<C> {
    pub fn new(mode: JoinMode, clock: C) -> Self {
        Self { mode, clock, states: Mutex::new(BTreeMap::new()) }
    }

    pub fn mode(&self) -> JoinMode {
        self.mode
    }

    /// Record one arriving slot under the token's join key.
    ///
    /// `slots` is the operation's canonical input collection; an arriving
    /// attribute outside it, or a canonical collection that differs from
    /// the one the key was created with, is a workflow-definition fault
    /// and tears the key down.
    pub fn add_slot(&self, token: &Token, slots: &[SmolStr]) -> Result<SlotOutcome, TokenFault> {
        let key = token.id.join_key();
        let mut states = self.states.lock();

        if !slots.contains(&token.attribute_name) {
            states.remove(&key.0);
            return Err(TokenFault::WorkflowDefinition {
                reason: format!(
                    "attribute {:?} is not a canonical input of the join (expects {:?})",
                    token.attribute_name, slots
                ),
            });
        }

        let state = states.entry(key.0).or_insert_with(|| JoinState {
            slots: slots.to_vec(),
            inputs: IndexMap::new(),
            deadline_ms: token.not_after,
            contributions: Vec::new(),
        });

        if state.slots != slots {
            states.remove(&key.0);
            return Err(TokenFault::WorkflowDefinition {
                reason: format!("expected arity changed for join key {key}"),
            });
        }

        state.deadline_ms = state.deadline_ms.max(token.not_after);

        if state.inputs.contains_key(&token.attribute_name) {
            return Ok(SlotOutcome::Duplicate);
        }
        state.inputs.insert(token.attribute_name.clone(), token.attribute_value.clone());
        state.contributions.push(token.clone());
        Ok(SlotOutcome::Added)
    }

    /// Prune expired keys and fire whatever the mode allows, ascending.
    pub fn scan(&self) -> ScanReport {
        let now = self.clock.epoch_ms();
        let mut report = ScanReport::default();
        let mut states = self.states.lock();

        let expired: Vec<i32> =
            states.iter().filter(|(_, s)| now >= s.deadline_ms).map(|(k, _)| *k).collect();
        for key in expired {
            states.remove(&key);
            report.expired.push(TokenId(key));
        }

        match self.mode {
            JoinMode::Optimized => {
                let ready: Vec<i32> =
                    states.iter().filter(|(_, s)| s.is_complete()).map(|(k, _)| *k).collect();
                for key in ready {
                    if let Some(state) = states.remove(&key) {
                        if let Some(fired) = build_fired(TokenId(key), state) {
                            report.fired.push(fired);
                        }
                    }
                }
            }
            JoinMode::Sequential => loop {
                let lowest = match states.iter().next() {
                    Some((&key, state)) => (key, state.is_complete()),
                    None => break,
                };
                if lowest.1 {
                    if let Some(state) = states.remove(&lowest.0) {
                        if let Some(fired) = build_fired(TokenId(lowest.0), state) {
                            report.fired.push(fired);
                        }
                    }
                } else {
                    for (key, state) in states.iter().skip(1) {
                        if state.is_complete() {
                            report.blocked.push((TokenId(*key), TokenId(lowest.0)));
                        }
                    }
                    break;
                }
            },
        }

        report
    }

    /// Remove expired keys only; the periodic sweep path.
    pub fn sweep_expired(&self) -> Vec<TokenId> {
        let now = self.clock.epoch_ms();
        let mut states = self.states.lock();
        let expired: Vec<i32> =
            states.iter().filter(|(_, s)| now >= s.deadline_ms).map(|(k, _)| *k).collect();
        expired
            .into_iter()
            .map(|key| {
                states.remove(&key);
                TokenId(key)
            })
            .collect()
    }

    /// Tear down one key (fault cleanup).
    pub fn remove(&self, key: TokenId) {
        self.states.lock().remove(&key.0);
    }

    pub fn contains(&self, key: TokenId) -> bool {
        self.states.lock().contains_key(&key.0)
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all state; shutdown path.
    pub fn clear(&self) {
        self.states.lock().clear();
    }
}

/// Snapshot a complete state into a firing. `None` aborts the firing
/// when the tuple cannot be assembled; the key is already removed.
fn build_fired(key: TokenId, state: JoinState) -> Option<FiredJoin> {
    let mut args = Vec::with_capacity(state.slots.len());
    for slot in &state.slots {
        match state.inputs.get(slot) {
            Some(value) => args.push(value.clone()),
            None => {
                tracing::error!(key = %key, slot = %slot, "join fired with missing slot");
                return None;
            }
        }
    }
    let surviving = state.contributions.iter().min_by_key(|c| c.id)?.clone();
    let consumed = state.contributions.into_iter().filter(|c| c.id != surviving.id).collect();
    Some(FiredJoin { key, surviving, consumed, args })
}

#[cfg(test)]
#[path = "join_tests.rs"]
mod tests;
