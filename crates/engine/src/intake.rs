// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded priority intake between the transport and the orchestrator.
//!
//! Tokens dequeue in ascending token-id order (lower id first), ties
//! broken by arrival order. Capacity is enforced on the producer side;
//! the consumer observes the residual depth for marking capture.

use crate::transport::TransportError;
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Semaphore, TryAcquireError};
use weft_core::Token;

/// One dequeued token plus the marking observation taken with it.
#[derive(Debug)]
pub struct Dequeued {
    pub token: Token,
    /// Residual intake depth, not counting this token.
    pub buffer: usize,
    pub capacity: usize,
}

struct Entry {
    key: (i32, u64),
    token: Token,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Entry) -> bool {
        self.key == other.key
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Entry) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Entry) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

struct Shared {
    heap: Mutex<BinaryHeap<Reverse<Entry>>>,
    seq: AtomicU64,
    /// Tokens available to dequeue.
    items: Semaphore,
    /// Remaining capacity.
    space: Semaphore,
    capacity: usize,
}

/// Create a bounded intake pair.
pub fn intake(capacity: usize) -> (IntakeSender, Intake) {
    let shared = Arc::new(Shared {
        heap: Mutex::new(BinaryHeap::with_capacity(capacity)),
        seq: AtomicU64::new(0),
        items: Semaphore::new(0),
        space: Semaphore::new(capacity),
        capacity,
    });
    (IntakeSender { shared: shared.clone() }, Intake { shared })
}

/// Producer handle; clone freely across transport tasks.
#[derive(Clone)]
pub struct IntakeSender {
    shared: Arc<Shared>,
}

impl IntakeSender {
    /// Enqueue, waiting for capacity.
    pub async fn send(&self, token: Token) -> Result<(), TransportError> {
        let permit =
            self.shared.space.acquire().await.map_err(|_| TransportError::IntakeClosed)?;
        permit.forget();
        self.push(token);
        Ok(())
    }

    /// Enqueue without waiting; `IntakeFull` when at capacity.
    pub fn try_send(&self, token: Token) -> Result<(), TransportError> {
        match self.shared.space.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.push(token);
                Ok(())
            }
            Err(TryAcquireError::NoPermits) => Err(TransportError::IntakeFull),
            Err(TryAcquireError::Closed) => Err(TransportError::IntakeClosed),
        }
    }

    fn push(&self, token: Token) {
        let seq = self.shared.seq.fetch_add(1, Ordering::Relaxed);
        self.shared.heap.lock().push(Reverse(Entry { key: (token.id.0, seq), token }));
        self.shared.items.add_permits(1);
    }
}

/// Consumer handle held by the orchestrator's reactor.
pub struct Intake {
    shared: Arc<Shared>,
}

impl Intake {
    /// Dequeue the lowest-id token; `None` once closed.
    pub async fn recv(&self) -> Option<Dequeued> {
        let permit = self.shared.items.acquire().await.ok()?;
        permit.forget();
        let (token, buffer) = {
            let mut heap = self.shared.heap.lock();
            let entry = heap.pop()?;
            (entry.0.token, heap.len())
        };
        self.shared.space.add_permits(1);
        Some(Dequeued { token, buffer, capacity: self.shared.capacity })
    }

    /// Stop both sides; pending and future operations fail fast.
    pub fn close(&self) {
        self.shared.items.close();
        self.shared.space.close();
    }

    pub fn len(&self) -> usize {
        self.shared.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

#[cfg(test)]
#[path = "intake_tests.rs"]
mod tests;
