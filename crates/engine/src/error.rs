// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error split: per-token faults the loop absorbs vs fatal
//! initialization errors that abort startup.

use crate::invoker::InvokeError;
use crate::transport::TransportError;
use smol_str::SmolStr;
use thiserror::Error;
use weft_core::TokenId;
use weft_rules::RulesError;

/// Faults scoped to one token. The orchestrator logs them (at a severity
/// matching the kind) and moves to the next token; it never crashes on
/// one of these.
#[derive(Debug, Error)]
pub enum TokenFault {
    /// Token addressed to another service; dropped without trace records.
    #[error("token {token} addressed to {service}")]
    AddressMismatch { token: TokenId, service: SmolStr },

    #[error("rule-base version {version:?} not registered")]
    UnknownVersion { version: SmolStr },

    /// The cache is left untouched; a later token may succeed.
    #[error("rule load failed: {0}")]
    RuleLoad(#[from] RulesError),

    /// Arity mismatch, wrong attribute, unknown node type. The join key
    /// is cleaned up and the token ages out.
    #[error("workflow definition error: {reason}")]
    WorkflowDefinition { reason: String },

    /// Missing canonical return or destination. Aborts this token's
    /// processing, never the orchestrator.
    #[error("routing configuration error: {reason}")]
    RoutingConfig { reason: String },

    /// No publish, no retry at this layer.
    #[error("invocation failed: {0}")]
    Invocation(#[from] InvokeError),

    #[error("join {key} expired before completion")]
    DeadlineExpired { key: TokenId },

    #[error("publish failed: {0}")]
    Publish(#[from] TransportError),
}

/// Fatal errors surfaced during initialization only.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transport failed to start after {attempts} attempts: {source}")]
    TransportStartup {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] weft_storage::StorageError),
}
