// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-place orchestrator loop.
//!
//! Per iteration: dequeue, filter, derive the operation profile from the
//! cached rule base, classify on (input requirement, node kind), run the
//! join path where required, invoke the bound service, route outputs,
//! and write instrumentation and measurement rows.

use crate::error::{EngineError, TokenFault};
use crate::instrument::{Instrumenter, TraceSink};
use crate::intake::{Dequeued, IntakeSender};
use crate::invoker::{InvokeRequest, ServiceRegistry};
use crate::join::{JoinCoordinator, JoinMode, SlotOutcome};
use crate::measure::{InvocationTiming, MeasurementSink, MeasurementsWriter};
use crate::reactor::{BackoffPolicy, Reactor};
use crate::router::Router;
use crate::transport::{TokenPublisher, TokenSource, TransportError};
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use weft_core::{Clock, PlaceId, Token};
use weft_rules::{InputMode, OperationProfile, RuleBase, RulesError};

/// Startup parameters for one place.
pub struct OrchestratorConfig {
    pub place: PlaceId,
    /// Root containing `RuleFolder.<version>` directories.
    pub rule_root: PathBuf,
    /// Versions this place accepts; others are rejected per token.
    pub registered_versions: Vec<SmolStr>,
    pub join_mode: JoinMode,
    /// Local gate for measurement rows, ANDed with each token's flag.
    pub monitor_incoming_events: bool,
    pub intake_capacity: usize,
    pub backoff: BackoffPolicy,
}

pub struct Orchestrator<P, C: Clock> {
    place: PlaceId,
    rule_root: PathBuf,
    versions: HashSet<SmolStr>,
    reactor: Reactor,
    backoff: BackoffPolicy,
    rule_cache: Mutex<HashMap<SmolStr, Arc<RuleBase>>>,
    joins: JoinCoordinator<C>,
    router: Router<P>,
    registry: Arc<ServiceRegistry>,
    instrument: Instrumenter<C>,
    measure: MeasurementsWriter,
    clock: C,
    shutdown: CancellationToken,
}

impl<P, C> Orchestrator<P, C>
where
    P: TokenPublisher,
    C: Clock,
{
    pub fn new(
        config: OrchestratorConfig,
        registry: Arc<ServiceRegistry>,
        publisher: Arc<P>,
        trace_sink: Arc<dyn TraceSink>,
        measurement_sink: Arc<dyn MeasurementSink>,
        clock: C,
    ) -> Self {
        let place = config.place.clone();
        Self {
            reactor: Reactor::new(config.intake_capacity),
            backoff: config.backoff,
            rule_root: config.rule_root,
            versions: config.registered_versions.into_iter().collect(),
            rule_cache: Mutex::new(HashMap::new()),
            joins: JoinCoordinator::new(config.join_mode, clock.clone()),
            router: Router::new(place.clone(), publisher),
            registry,
            instrument: Instrumenter::new(place.clone(), trace_sink, clock.clone()),
            measure: MeasurementsWriter::new(
                place.clone(),
                measurement_sink,
                config.monitor_incoming_events,
            ),
            clock,
            shutdown: CancellationToken::new(),
            place,
        }
    }

    pub fn place(&self) -> &PlaceId {
        &self.place
    }

    /// Producer handle for transports feeding this place.
    pub fn sender(&self) -> IntakeSender {
        self.reactor.sender()
    }

    pub fn intake_depth(&self) -> usize {
        self.reactor.buffer_len()
    }

    pub fn join_count(&self) -> usize {
        self.joins.len()
    }

    /// Bring the inbound transport up, with the configured backoff.
    pub async fn start_transport<S: TokenSource>(&self, source: &mut S) -> Result<(), EngineError> {
        self.reactor.start_transport(source, &self.backoff).await
    }

    /// Pre-populate the rule cache; embedders without a rule directory
    /// on disk register their knowledge directly.
    pub fn preload_rules(&self, version: &str, base: RuleBase) {
        self.rule_cache.lock().entry(SmolStr::new(version)).or_insert_with(|| Arc::new(base));
    }

    /// Inject a fresh workflow instance at this place, recording its
    /// GENERATED transition.
    pub async fn seed(&self, token: Token, transition_id: &str) -> Result<(), TransportError> {
        self.instrument.generated(&token, transition_id, self.reactor.buffer_len() as u32);
        self.reactor.sender().send(token).await
    }

    /// Run until shutdown. Blocks only at the dequeue; the shutdown flag
    /// is checked at every loop head, so a token being processed always
    /// finishes its invocation before the loop exits.
    pub async fn run(&self) {
        tracing::info!(place = %self.place, "orchestrator started");
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            // closing the intake wakes a blocked dequeue with None
            if !self.step().await {
                break;
            }
        }
        self.finalize();
        tracing::info!(place = %self.place, "orchestrator stopped");
    }

    /// Dequeue and process one token; false once the intake is closed.
    pub async fn step(&self) -> bool {
        match self.reactor.dequeue().await {
            Some(dequeued) => {
                self.process(dequeued).await;
                true
            }
            None => false,
        }
    }

    /// Idempotent: flags the loop, closes the intake. In-flight
    /// invocations complete; join state and rule cache clear when the
    /// loop exits.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.reactor.close();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Periodic reap: drop expired join keys, report how many.
    pub fn sweep_expired_joins(&self) -> usize {
        let expired = self.joins.sweep_expired();
        for key in &expired {
            tracing::warn!(place = %self.place, key = %key, "join expired during sweep");
        }
        expired.len()
    }

    fn finalize(&self) {
        self.joins.clear();
        self.rule_cache.lock().clear();
    }

    async fn process(&self, dequeued: Dequeued) {
        let Dequeued { token, buffer, capacity } = dequeued;
        let task_arrival_ms = self.clock.epoch_ms();
        let summary = token.log_summary();
        if let Err(fault) =
            self.process_token(token, buffer as u32, capacity as u32, task_arrival_ms).await
        {
            match &fault {
                TokenFault::AddressMismatch { token, service } => {
                    tracing::debug!(%token, %service, place = %self.place, "token addressed elsewhere, dropped");
                }
                TokenFault::UnknownVersion { .. } | TokenFault::RuleLoad(_) => {
                    tracing::warn!(error = %fault, place = %self.place, token = %summary, "token skipped");
                }
                _ => {
                    tracing::error!(error = %fault, place = %self.place, token = %summary, "token abandoned");
                }
            }
        }
    }

    async fn process_token(
        &self,
        token: Token,
        buffer: u32,
        capacity: u32,
        task_arrival_ms: u64,
    ) -> Result<(), TokenFault> {
        // Address and version filters come before any instrumentation:
        // a dropped token leaves no record at this place.
        if !self.place.accepts(&token) {
            return Err(TokenFault::AddressMismatch {
                token: token.id,
                service: token.service.clone(),
            });
        }
        if !self.versions.contains(&token.rule_version) {
            return Err(TokenFault::UnknownVersion { version: token.rule_version.clone() });
        }

        let base = self.rule_base(&token.rule_version)?;
        let profile = derive_profile(&base, self.place.operation.as_str())?;

        self.instrument.buffered(&token, buffer);
        let defer_enter = profile.node_kind.is_join_entry() && token.id.is_child();
        if !defer_enter {
            self.instrument.enter(&token, buffer);
        }

        let ctx = StepCtx { base: &base, profile: &profile, buffer, capacity, task_arrival_ms };

        match profile.input_mode() {
            InputMode::ZeroInput | InputMode::AnyOf => {
                let args = vec![token.attribute_value.clone()];
                self.invoke_and_route(&ctx, &token, args, token.workflow_start_ms).await
            }
            InputMode::Single => {
                if !profile.node_kind.single_input_ok() {
                    self.joins.remove(token.id.join_key());
                    return Err(TokenFault::WorkflowDefinition {
                        reason: format!(
                            "node kind {} cannot take a single direct input",
                            profile.node_kind
                        ),
                    });
                }
                let canonical = profile.inputs.first().cloned().unwrap_or_default();
                if token.attribute_name != canonical {
                    self.joins.remove(token.id.join_key());
                    return Err(TokenFault::WorkflowDefinition {
                        reason: format!(
                            "expected attribute {:?}, received {:?}",
                            canonical, token.attribute_name
                        ),
                    });
                }
                let args = vec![token.attribute_value.clone()];
                self.invoke_and_route(&ctx, &token, args, token.workflow_start_ms).await
            }
            InputMode::Synchronized => self.synchronize(&ctx, token).await,
        }
    }

    /// Join path: record the slot, then fire whatever the mode allows.
    async fn synchronize(&self, ctx: &StepCtx<'_>, token: Token) -> Result<(), TokenFault> {
        match self.joins.add_slot(&token, &ctx.profile.inputs)? {
            SlotOutcome::Added => {}
            SlotOutcome::Duplicate => {
                tracing::debug!(token = %token.id, place = %self.place, "duplicate slot ignored");
            }
        }

        let report = self.joins.scan();
        for key in &report.expired {
            tracing::warn!(place = %self.place, key = %key, "join expired, participants dropped");
        }
        for (ready, blocking) in &report.blocked {
            tracing::info!(place = %self.place, ready = %ready, blocking = %blocking,
                "completed join blocked behind lower key");
        }

        for fired in report.fired {
            // The surviving branch's own token continues: id, workflow
            // start, rule version, and generator provenance are all its.
            // Keys fired in the same scan may carry different versions,
            // so each resolves its own rule base.
            let continuing = fired.surviving;
            let base = self.rule_base(&continuing.rule_version)?;
            let profile = derive_profile(&base, self.place.operation.as_str())?;
            let fired_ctx = StepCtx {
                base: &base,
                profile: &profile,
                buffer: ctx.buffer,
                capacity: ctx.capacity,
                task_arrival_ms: ctx.task_arrival_ms,
            };
            for consumed in &fired.consumed {
                self.instrument.join_consumed(consumed, fired_ctx.buffer);
            }
            self.instrument.enter(&continuing, fired_ctx.buffer);
            self.invoke_and_route(
                &fired_ctx,
                &continuing,
                fired.args,
                continuing.workflow_start_ms,
            )
            .await?;
        }
        Ok(())
    }

    async fn invoke_and_route(
        &self,
        ctx: &StepCtx<'_>,
        token: &Token,
        args: Vec<String>,
        workflow_start_ms: u64,
    ) -> Result<(), TokenFault> {
        let invocation_ms = self.clock.epoch_ms();
        let token_id_str = token.id.to_string();
        let request = InvokeRequest {
            token_id: &token_id_str,
            service: self.place.service.as_str(),
            operation: self.place.operation.as_str(),
            args: &args,
            return_attribute: ctx.profile.return_attribute.as_str(),
            rule_version: token.rule_version.as_str(),
        };
        let result = self.registry.invoke(&request)?;

        let outcome = self.router.route(ctx.base, ctx.profile, token, &result).await?;
        let publish_ms = self.clock.epoch_ms();

        for exit in &outcome.exits {
            let to_place = exit.to_place.to_string();
            if exit.forked_child {
                self.instrument.fork(token, &exit.token, &to_place, ctx.buffer);
            }
            self.instrument.exit(&exit.token, &to_place, exit.arc_value.clone(), ctx.buffer);
        }
        if outcome.terminated {
            self.instrument.terminate(token, ctx.buffer);
        }

        self.measure.record(
            token,
            workflow_start_ms,
            InvocationTiming {
                task_arrival_ms: ctx.task_arrival_ms,
                invocation_ms,
                publish_ms,
                buffer: ctx.buffer,
                capacity: ctx.capacity,
            },
        );
        Ok(())
    }

    /// Version-keyed cache with put-if-absent; a failed load never
    /// poisons the cache.
    fn rule_base(&self, version: &SmolStr) -> Result<Arc<RuleBase>, TokenFault> {
        if let Some(base) = self.rule_cache.lock().get(version) {
            return Ok(base.clone());
        }
        let loaded =
            weft_rules::load_rule_base(&self.rule_root, version, self.place.operation.as_str())?;
        let base = Arc::new(loaded);
        let mut cache = self.rule_cache.lock();
        Ok(cache.entry(version.clone()).or_insert(base).clone())
    }
}

/// Per-iteration context threaded through the dispatch arms.
struct StepCtx<'a> {
    base: &'a RuleBase,
    profile: &'a OperationProfile,
    buffer: u32,
    capacity: u32,
    task_arrival_ms: u64,
}

/// Profile derivation failures split by policy: structural gaps are
/// workflow-definition faults, everything else is a rule-load fault.
fn derive_profile(base: &RuleBase, operation: &str) -> Result<OperationProfile, TokenFault> {
    OperationProfile::derive(base, operation).map_err(|e| match e {
        RulesError::MissingRelation { .. } | RulesError::UnknownNodeType(_) => {
            TokenFault::WorkflowDefinition { reason: e.to_string() }
        }
        other => TokenFault::RuleLoad(other),
    })
}

#[cfg(test)]
#[path = "orchestrator_tests/mod.rs"]
mod tests;
