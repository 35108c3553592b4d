// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service invocation through an explicitly-wired registry.
//!
//! Business logic is bound at startup as function values keyed by
//! `(service, operation)`; there is no dynamic lookup. Invocation is
//! synchronous from the orchestrator's view and the caller captures
//! wall-clock timestamps around the call.

use smol_str::SmolStr;
use std::collections::HashMap;
use thiserror::Error;

/// Arguments handed to a bound service, inputs in canonical slot order.
#[derive(Debug)]
pub struct InvokeRequest<'a> {
    pub token_id: &'a str,
    pub service: &'a str,
    pub operation: &'a str,
    pub args: &'a [String],
    pub return_attribute: &'a str,
    pub rule_version: &'a str,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("no service bound for {service}.{operation}")]
    NotRegistered { service: String, operation: String },

    #[error("{0}")]
    Failed(String),
}

type Handler = Box<dyn Fn(&InvokeRequest<'_>) -> Result<String, InvokeError> + Send + Sync>;

/// `(service, operation)` to handler table, built once at startup.
#[derive(Default)]
pub struct ServiceRegistry {
    handlers: HashMap<(SmolStr, SmolStr), Handler>,
}

impl ServiceRegistry {
    pub fn new() -> ServiceRegistry {
        ServiceRegistry::default()
    }

    pub fn register<F>(&mut self, service: &str, operation: &str, handler: F)
    where
        F: Fn(&InvokeRequest<'_>) -> Result<String, InvokeError> + Send + Sync + 'static,
    {
        self.handlers
            .insert((SmolStr::new(service), SmolStr::new(operation)), Box::new(handler));
    }

    pub fn invoke(&self, request: &InvokeRequest<'_>) -> Result<String, InvokeError> {
        let key = (SmolStr::new(request.service), SmolStr::new(request.operation));
        let handler = self.handlers.get(&key).ok_or_else(|| InvokeError::NotRegistered {
            service: request.service.to_string(),
            operation: request.operation.to_string(),
        })?;
        handler(request)
    }

    pub fn is_registered(&self, service: &str, operation: &str) -> bool {
        self.handlers.contains_key(&(SmolStr::new(service), SmolStr::new(operation)))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
#[path = "invoker_tests.rs"]
mod tests;
