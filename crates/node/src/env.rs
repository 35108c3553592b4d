// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the node crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: WEFT_STATE_DIR > XDG_STATE_HOME/weft >
/// ~/.local/state/weft
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("WEFT_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("weft"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/weft"))
}

/// Config file override; the CLI argument wins over this.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("WEFT_CONFIG").ok().map(PathBuf::from)
}

/// Shutdown drain timeout (default 5s, configurable via
/// `WEFT_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("WEFT_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
