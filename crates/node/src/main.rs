// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! weftd: host one or more workflow places from a TOML config.
//!
//! Usage: `weftd [config.toml]`. The config path falls back to
//! `WEFT_CONFIG`, then `weft.toml` in the working directory.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use weft_engine::ServiceRegistry;
use weft_node::{env, Config, Node};

fn init_tracing(state_dir: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,weft_engine=info"));
    match state_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), "weftd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

/// Passthrough bindings so a freshly configured node is drivable before
/// real services are linked in: every configured operation echoes its
/// first argument.
fn passthrough_registry(config: &Config) -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    for place in &config.places {
        registry.register(place.service.as_str(), place.operation.as_str(), |req| {
            Ok(req.args.first().cloned().unwrap_or_default())
        });
    }
    registry
}

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(env::config_path)
        .unwrap_or_else(|| PathBuf::from("weft.toml"))
}

#[tokio::main]
async fn main() {
    let path = config_path();
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("weftd: {e}");
            std::process::exit(2);
        }
    };

    let state_dir = config.state_dir.clone().or_else(env::state_dir);
    let _guard = init_tracing(state_dir.as_ref());

    let registry = Arc::new(passthrough_registry(&config));
    let node = match Node::start(&config, registry).await {
        Ok(node) => node,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("weftd: {e}");
            std::process::exit(1);
        }
    };

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("interrupt received, shutting down"),
        Err(e) => tracing::error!(error = %e, "signal handler failed, shutting down"),
    }
    node.shutdown().await;
}
