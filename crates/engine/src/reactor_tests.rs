// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::EngineError;
use crate::test_support::FlakySource;
use std::sync::atomic::Ordering;

fn policy() -> BackoffPolicy {
    BackoffPolicy::default()
}

#[tokio::test(start_paused = true)]
async fn starts_on_first_attempt() {
    let reactor = Reactor::new(8);
    let mut source = FlakySource::failing(0);
    reactor.start_transport(&mut source, &policy()).await.unwrap();
    assert_eq!(source.attempts.load(Ordering::Relaxed), 1);
}

#[tokio::test(start_paused = true)]
async fn retries_with_backoff_then_succeeds() {
    let reactor = Reactor::new(8);
    let mut source = FlakySource::failing(2);
    let started = tokio::time::Instant::now();
    reactor.start_transport(&mut source, &policy()).await.unwrap();
    assert_eq!(source.attempts.load(Ordering::Relaxed), 3);
    // 1s then 2s of backoff
    assert!(started.elapsed() >= std::time::Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn aborts_after_exhausting_attempts() {
    let reactor = Reactor::new(8);
    let mut source = FlakySource::failing(10);
    match reactor.start_transport(&mut source, &policy()).await {
        Err(EngineError::TransportStartup { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected TransportStartup, got {other:?}"),
    }
    assert_eq!(source.attempts.load(Ordering::Relaxed), 3);
}
