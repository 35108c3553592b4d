// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weft-storage: Append-only analytical sinks.
//!
//! Both logs are JSON Lines: one self-describing record per line, append
//! and flush, replayable by line. The marking analysis and the timeline
//! animator consume these files offline.

mod measurements;
mod trace_log;

pub use measurements::{MeasurementLog, MeasurementRow, VALID_TOTAL_MS};
pub use trace_log::TraceLog;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
