// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node configuration: a TOML file describing the hosted places and the
//! knobs the engine reads at startup.
//!
//! ```toml
//! rule_root = "rules"
//! completed_join_priority = true
//! monitor_incoming_events = true
//! stats_interval_minutes = 15
//!
//! [[place]]
//! service = "SvcX"
//! operation = "opX"
//! versions = ["11"]
//! service_channel = "ch-x"
//! rule_port = 9401
//! ```

use serde::Deserialize;
use smol_str::SmolStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use weft_core::PlaceId;
use weft_engine::{BackoffPolicy, JoinMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config has no [[place]] entries")]
    NoPlaces,
}

/// One hosted place.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceConfig {
    pub service: SmolStr,
    pub operation: SmolStr,
    /// Rule-base versions this place accepts.
    pub versions: Vec<SmolStr>,
    /// Inbound channel name this place binds.
    pub service_channel: SmolStr,
    /// Inbound port this place binds.
    pub rule_port: u16,
}

impl PlaceConfig {
    pub fn place_id(&self) -> PlaceId {
        PlaceId::new(self.service.clone(), self.operation.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory holding `RuleFolder.<version>` trees.
    pub rule_root: PathBuf,
    /// State directory for logs and analytical sinks; defaults from the
    /// environment when absent.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// OPTIMIZED join firing when true (the default), SEQUENTIAL when
    /// false.
    #[serde(default = "default_true")]
    pub completed_join_priority: bool,
    /// Local gate for measurement rows.
    #[serde(default = "default_true")]
    pub monitor_incoming_events: bool,
    #[serde(default = "default_stats_interval")]
    pub stats_interval_minutes: u64,
    #[serde(default = "default_reactor_retries")]
    pub max_reactor_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "default_intake_capacity")]
    pub intake_capacity: usize,
    /// TCP listen address for inter-process tokens; loopback-only
    /// deployments omit it.
    #[serde(default)]
    pub listen_addr: Option<String>,
    #[serde(rename = "place")]
    pub places: Vec<PlaceConfig>,
}

fn default_true() -> bool {
    true
}

fn default_stats_interval() -> u64 {
    15
}

fn default_reactor_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_intake_capacity() -> usize {
    256
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Config::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(content)?;
        if config.places.is_empty() {
            return Err(ConfigError::NoPlaces);
        }
        Ok(config)
    }

    pub fn join_mode(&self) -> JoinMode {
        if self.completed_join_priority {
            JoinMode::Optimized
        } else {
            JoinMode::Sequential
        }
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_retries: self.max_reactor_retries,
            initial_delay: Duration::from_millis(self.initial_retry_delay_ms),
        }
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_minutes.max(1) * 60)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
