// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Place identity: the fixed `(service, operation)` pair a node answers for.

use crate::token::Token;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identity of one place in the service graph.
///
/// Tokens whose destination service differs are dropped silently by the
/// address filter; the operation selects the rule-base file and the bound
/// business logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceId {
    pub service: SmolStr,
    pub operation: SmolStr,
}

impl PlaceId {
    pub fn new(service: impl Into<SmolStr>, operation: impl Into<SmolStr>) -> Self {
        Self { service: service.into(), operation: operation.into() }
    }

    /// Address filter: does this place accept the token's destination?
    pub fn accepts(&self, token: &Token) -> bool {
        self.service == token.service
    }

    /// Parse `Service.operation`. The operation is the segment after the
    /// last dot, so fully-qualified service names keep their own dots.
    pub fn parse(s: &str) -> Option<PlaceId> {
        let (service, operation) = s.rsplit_once('.')?;
        if service.is_empty() || operation.is_empty() {
            return None;
        }
        Some(PlaceId::new(service, operation))
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.service, self.operation)
    }
}

#[cfg(test)]
#[path = "place_tests.rs"]
mod tests;
