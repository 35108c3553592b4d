// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator loop tests: scenario walks, filters, and fault policy.

mod faults;
mod filters;
mod scenarios;

use super::*;
use crate::instrument::MemorySink;
use crate::measure::MemoryMeasurements;
use crate::test_support::MemoryPublisher;
use weft_core::{FakeClock, TokenBuilder};
use weft_rules::Fact;

pub(crate) struct Harness {
    pub orch: Orchestrator<MemoryPublisher, FakeClock>,
    pub publisher: Arc<MemoryPublisher>,
    pub trace: Arc<MemorySink>,
    pub rows: Arc<MemoryMeasurements>,
}

impl Harness {
    /// Enqueue one token and run one loop iteration.
    pub async fn deliver(&self, token: Token) {
        self.orch.sender().send(token).await.unwrap();
        assert!(self.orch.step().await);
    }
}

/// Place `SvcX.opX`, version `"11"` preloaded with `facts`, monitoring on.
pub(crate) fn harness(
    facts: Vec<Fact>,
    mode: JoinMode,
    configure: impl FnOnce(&mut ServiceRegistry),
) -> Harness {
    let h = bare_harness(mode, configure);
    h.orch.preload_rules("11", RuleBase::new(facts, "test".to_string()));
    h
}

/// Same place with nothing preloaded; rule loads hit `rule_root`.
pub(crate) fn bare_harness(
    mode: JoinMode,
    configure: impl FnOnce(&mut ServiceRegistry),
) -> Harness {
    let mut registry = ServiceRegistry::new();
    configure(&mut registry);
    let publisher = Arc::new(MemoryPublisher::new());
    let trace = Arc::new(MemorySink::new());
    let rows = Arc::new(MemoryMeasurements::new());
    let clock = FakeClock::at(1_000_000);
    let orch = Orchestrator::new(
        OrchestratorConfig {
            place: PlaceId::new("SvcX", "opX"),
            rule_root: PathBuf::from("/nonexistent/rules"),
            registered_versions: vec![SmolStr::new("11"), SmolStr::new("12")],
            join_mode: mode,
            monitor_incoming_events: true,
            intake_capacity: 64,
            backoff: BackoffPolicy::default(),
        },
        Arc::new(registry),
        publisher.clone(),
        trace.clone(),
        rows.clone(),
        clock,
    );
    Harness { orch, publisher, trace, rows }
}

pub(crate) fn echo(registry: &mut ServiceRegistry) {
    registry.register("SvcX", "opX", |req| Ok(req.args.join(",")));
}
