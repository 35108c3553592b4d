// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-invocation timing and marking rows.

use crate::StorageError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A row whose publish-minus-arrival span exceeds this is tagged invalid
/// instead of dropped; timing validation filters on the tag.
pub const VALID_TOTAL_MS: u64 = 30_000;

/// One service invocation's timing and marking observation.
///
/// Field names are shared with the analytics consumers and serialize in
/// camelCase as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRow {
    /// Token id of the invocation.
    pub sequence_id: i32,
    pub service_name: SmolStr,
    pub operation: SmolStr,
    pub arrival_time: u64,
    pub invocation_time: u64,
    pub publish_time: u64,
    pub workflow_start_time: u64,
    /// Residual intake depth at dequeue.
    pub buffer_size: u32,
    pub max_queue_capacity: u32,
    /// Instantaneous marking: `buffer_size + 1`.
    pub total_marking: u32,
    pub valid: bool,
}

impl MeasurementRow {
    /// Total wall-clock span this row observed.
    pub fn total_ms(&self) -> u64 {
        self.publish_time.saturating_sub(self.arrival_time)
    }

    /// Apply the validity tag from the row's own timing.
    pub fn tagged(mut self) -> MeasurementRow {
        self.valid = self.total_ms() <= VALID_TOTAL_MS;
        self
    }
}

/// Append-only measurement log.
pub struct MeasurementLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl MeasurementLog {
    /// Open for append, creating the file and parent directory.
    pub fn open(path: &Path) -> Result<MeasurementLog, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| StorageError::Open { path: path.to_path_buf(), source })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StorageError::Open { path: path.to_path_buf(), source })?;
        Ok(MeasurementLog { path: path.to_path_buf(), writer: BufWriter::new(file) })
    }

    pub fn append(&mut self, row: &MeasurementRow) -> Result<(), StorageError> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StorageError> {
        Ok(self.writer.flush()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay every row in the file, skipping lines that fail to parse
    /// (a torn final line after a crash is expected, not fatal).
    pub fn read_all(path: &Path) -> Result<Vec<MeasurementRow>, StorageError> {
        let file = File::open(path)
            .map_err(|source| StorageError::Open { path: path.to_path_buf(), source })?;
        let mut rows = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(row) => rows.push(row),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable measurement row"),
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "measurements_tests.rs"]
mod tests;
