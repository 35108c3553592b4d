// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reactor owns the intake and brings the inbound transport up.

use crate::error::EngineError;
use crate::intake::{intake, Dequeued, Intake, IntakeSender};
use crate::transport::TokenSource;
use std::time::Duration;

/// Exponential backoff for transport startup.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { max_retries: 3, initial_delay: Duration::from_secs(1) }
    }
}

/// Deterministic token delivery for one orchestrator.
pub struct Reactor {
    queue: Intake,
    sender: IntakeSender,
}

impl Reactor {
    pub fn new(capacity: usize) -> Reactor {
        let (sender, queue) = intake(capacity);
        Reactor { queue, sender }
    }

    /// Producer handle for transports and seeding.
    pub fn sender(&self) -> IntakeSender {
        self.sender.clone()
    }

    /// Start the transport, retrying with exponential backoff. Exhausting
    /// the attempts aborts orchestrator initialization.
    pub async fn start_transport<S: TokenSource>(
        &self,
        source: &mut S,
        policy: &BackoffPolicy,
    ) -> Result<(), EngineError> {
        let mut delay = policy.initial_delay;
        let mut attempt: u32 = 1;
        loop {
            match source.start(self.sender()).await {
                Ok(()) => return Ok(()),
                Err(source_err) if attempt >= policy.max_retries.max(1) => {
                    return Err(EngineError::TransportStartup {
                        attempts: attempt,
                        source: source_err,
                    });
                }
                Err(source_err) => {
                    tracing::warn!(
                        error = %source_err,
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        "transport start failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
            }
        }
    }

    /// Block until a token is available; `None` once the intake closes.
    pub async fn dequeue(&self) -> Option<Dequeued> {
        self.queue.recv().await
    }

    pub fn close(&self) {
        self.queue.close();
    }

    pub fn buffer_len(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

#[cfg(test)]
#[path = "reactor_tests.rs"]
mod tests;
