// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node startup, the periodic stats task, and graceful shutdown.

use crate::config::Config;
use crate::transport::{ChannelHub, HubSource, TcpTokenListener};
use fs2::FileExt;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use weft_core::SystemClock;
use weft_engine::{
    EngineError, FileMeasurements, FileSink, Orchestrator, OrchestratorConfig, ServiceRegistry,
};
use weft_storage::{MeasurementLog, StorageError, TraceLog};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no state directory available")]
    NoStateDir,

    #[error("another node holds the lock: {0}")]
    LockFailed(std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

type PlaceOrchestrator = Orchestrator<ChannelHub, SystemClock>;

/// A running node: one orchestrator task per configured place.
pub struct Node {
    pub hub: Arc<ChannelHub>,
    places: Vec<Arc<PlaceOrchestrator>>,
    shutdown: CancellationToken,
    tasks: Vec<tokio::task::JoinHandle<()>>,
    _lock_file: std::fs::File,
}

impl Node {
    /// Bring every configured place up. `registry` binds the business
    /// logic; the registry is shared by all places in the process.
    pub async fn start(config: &Config, registry: Arc<ServiceRegistry>) -> Result<Node, LifecycleError> {
        let state_dir = config
            .state_dir
            .clone()
            .or_else(crate::env::state_dir)
            .ok_or(LifecycleError::NoStateDir)?;
        std::fs::create_dir_all(&state_dir)?;

        // Exclusive lock first: two nodes sharing a state dir would
        // interleave their analytical logs.
        let lock_path = state_dir.join("weftd.lock");
        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;

        let trace_sink =
            Arc::new(FileSink::new(TraceLog::open(&state_dir.join("trace.jsonl"))?));
        let measurement_sink = Arc::new(FileMeasurements::new(MeasurementLog::open(
            &state_dir.join("measurements.jsonl"),
        )?));

        let hub = Arc::new(ChannelHub::new());
        let shutdown = CancellationToken::new();
        let mut places = Vec::with_capacity(config.places.len());
        let mut tasks = Vec::new();

        for place_cfg in &config.places {
            let orch = Arc::new(Orchestrator::new(
                OrchestratorConfig {
                    place: place_cfg.place_id(),
                    rule_root: config.rule_root.clone(),
                    registered_versions: place_cfg.versions.clone(),
                    join_mode: config.join_mode(),
                    monitor_incoming_events: config.monitor_incoming_events,
                    intake_capacity: config.intake_capacity,
                    backoff: config.backoff(),
                },
                registry.clone(),
                hub.clone(),
                trace_sink.clone(),
                measurement_sink.clone(),
                SystemClock,
            ));

            let mut source =
                HubSource::new(hub.clone(), place_cfg.service_channel.as_str(), place_cfg.rule_port);
            orch.start_transport(&mut source).await?;

            let runner = orch.clone();
            tasks.push(tokio::spawn(async move { runner.run().await }));
            places.push(orch);
        }

        if let Some(addr) = &config.listen_addr {
            let listener = TcpTokenListener::new(hub.clone(), shutdown.clone());
            let addr = addr.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = listener.serve(&addr).await {
                    tracing::error!(error = %e, "token listener failed");
                }
            }));
        }

        tasks.push(spawn_stats_task(
            places.clone(),
            config.stats_interval(),
            shutdown.clone(),
        ));

        tracing::info!(
            places = places.len(),
            state_dir = %state_dir.display(),
            mode = ?config.join_mode(),
            "node started"
        );

        Ok(Node { hub, places, shutdown, tasks, _lock_file: lock_file })
    }

    pub fn places(&self) -> &[Arc<PlaceOrchestrator>] {
        &self.places
    }

    /// Find the hosted place serving `service`.
    pub fn place(&self, service: &str) -> Option<&Arc<PlaceOrchestrator>> {
        self.places.iter().find(|p| p.place().service == service)
    }

    /// Idempotent. Flags every loop, waits out the drain timeout, then
    /// aborts stragglers.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        for place in &self.places {
            place.shutdown();
        }
        let drain = crate::env::drain_timeout();
        for mut task in self.tasks.drain(..) {
            if tokio::time::timeout(drain, &mut task).await.is_err() {
                task.abort();
                tracing::warn!("task did not drain in time, aborted");
            }
        }
        tracing::info!("node stopped");
    }
}

/// Periodic statistics and join reaping across all hosted places.
fn spawn_stats_task(
    places: Vec<Arc<PlaceOrchestrator>>,
    interval: std::time::Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await; // immediate first tick
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = ticker.tick() => {
                    for place in &places {
                        let swept = place.sweep_expired_joins();
                        tracing::info!(
                            place = %place.place(),
                            at = %chrono::Utc::now().to_rfc3339(),
                            intake = place.intake_depth(),
                            joins = place.join_count(),
                            swept,
                            "place statistics"
                        );
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
