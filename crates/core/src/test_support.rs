// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders shared by this crate's tests and, behind the `test-support`
//! feature, by other crates' tests.

use crate::token::{Token, TokenId};
use smol_str::SmolStr;

/// Builder producing a token with sensible defaults for tests.
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    token: Token,
}

impl TokenBuilder {
    pub fn new(id: i32) -> Self {
        Self {
            token: Token {
                id: TokenId(id),
                rule_version: SmolStr::new("11"),
                service: SmolStr::new("SvcX"),
                operation: SmolStr::new("opX"),
                attribute_name: SmolStr::new("in"),
                attribute_value: "0".to_string(),
                status: SmolStr::new("pending"),
                not_after: u64::MAX,
                workflow_start_ms: 1_000_000,
                event_arrival_ms: 0,
                generator_timestamp_ms: 0,
                source_generator: SmolStr::new("test-gen"),
                monitor: true,
            },
        }
    }

    pub fn service(mut self, service: &str) -> Self {
        self.token.service = SmolStr::new(service);
        self
    }

    pub fn operation(mut self, operation: &str) -> Self {
        self.token.operation = SmolStr::new(operation);
        self
    }

    pub fn slot(mut self, name: &str, value: &str) -> Self {
        self.token.attribute_name = SmolStr::new(name);
        self.token.attribute_value = value.to_string();
        self
    }

    pub fn rule_version(mut self, version: &str) -> Self {
        self.token.rule_version = SmolStr::new(version);
        self
    }

    pub fn not_after(mut self, deadline_ms: u64) -> Self {
        self.token.not_after = deadline_ms;
        self
    }

    pub fn workflow_start(mut self, epoch_ms: u64) -> Self {
        self.token.workflow_start_ms = epoch_ms;
        self
    }

    pub fn arrival(mut self, epoch_ms: u64) -> Self {
        self.token.event_arrival_ms = epoch_ms;
        self
    }

    pub fn generator(mut self, name: &str) -> Self {
        self.token.source_generator = SmolStr::new(name);
        self
    }

    pub fn monitor(mut self, monitor: bool) -> Self {
        self.token.monitor = monitor;
        self
    }

    pub fn build(self) -> Token {
        self.token
    }
}
