// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory transport doubles for this crate's tests and, behind the
//! `test-support` feature, for other crates' tests.

use crate::intake::IntakeSender;
use crate::transport::{Destination, TokenPublisher, TokenSource, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use weft_core::Token;

/// Captures published tokens instead of delivering them.
#[derive(Default)]
pub struct MemoryPublisher {
    published: Mutex<Vec<(Destination, Token)>>,
}

impl MemoryPublisher {
    pub fn new() -> MemoryPublisher {
        MemoryPublisher::default()
    }

    pub fn snapshot(&self) -> Vec<(Destination, Token)> {
        self.published.lock().clone()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.published.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.published.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenPublisher for MemoryPublisher {
    async fn publish(&self, dest: &Destination, token: Token) -> Result<(), TransportError> {
        self.published.lock().push((dest.clone(), token));
        Ok(())
    }
}

/// A source that fails a configured number of starts before succeeding.
pub struct FlakySource {
    failures_remaining: u32,
    pub attempts: AtomicU32,
}

impl FlakySource {
    pub fn failing(times: u32) -> FlakySource {
        FlakySource { failures_remaining: times, attempts: AtomicU32::new(0) }
    }
}

#[async_trait]
impl TokenSource for FlakySource {
    async fn start(&mut self, _intake: IntakeSender) -> Result<(), TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt <= self.failures_remaining {
            Err(TransportError::Bind {
                channel: "ch-test".to_string(),
                port: 0,
                reason: format!("simulated failure {attempt}"),
            })
        } else {
            Ok(())
        }
    }
}
