// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! Join deadlines and measurement rows are all epoch-millisecond values,
//! so the epoch view is primary; `Instant` backs backoff arithmetic.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn epoch_ms(&self) -> u64;
    fn now(&self) -> Instant;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Fake clock for tests; both views advance together.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<(Instant, u64)>>,
}

impl FakeClock {
    /// Starts at an arbitrary fixed epoch so deadline tests are stable.
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new((Instant::now(), 1_000_000))) }
    }

    pub fn at(epoch_ms: u64) -> Self {
        Self { inner: Arc::new(Mutex::new((Instant::now(), epoch_ms))) }
    }

    pub fn advance(&self, duration: Duration) {
        let mut guard = self.inner.lock();
        guard.0 += duration;
        guard.1 += duration.as_millis() as u64;
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        self.inner.lock().1 = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        self.inner.lock().1
    }

    fn now(&self) -> Instant {
        self.inner.lock().0
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
