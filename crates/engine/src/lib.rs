// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weft-engine: The per-place orchestrator.
//!
//! One [`Orchestrator`] owns one place: it dequeues tokens from a bounded
//! priority intake, synchronizes join inputs, invokes the bound service
//! through the registry, routes results along outgoing arcs, and emits
//! the instrumentation and measurement streams.

mod error;
mod instrument;
mod intake;
mod invoker;
mod join;
mod measure;
mod orchestrator;
mod reactor;
mod router;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{EngineError, TokenFault};
pub use instrument::{FileSink, Instrumenter, MemorySink, TraceSink};
pub use intake::{intake, Dequeued, Intake, IntakeSender};
pub use invoker::{InvokeError, InvokeRequest, ServiceRegistry};
pub use join::{FiredJoin, JoinCoordinator, JoinMode, ScanReport, SlotOutcome};
pub use measure::{
    FileMeasurements, InvocationTiming, MeasurementSink, MeasurementsWriter, MemoryMeasurements,
};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use reactor::{BackoffPolicy, Reactor};
pub use router::{ExitArc, RouteOutcome, Router};
pub use transport::{Destination, TokenPublisher, TokenSource, TransportError};
