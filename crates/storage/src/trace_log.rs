// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only log of instrumentation records.

use crate::StorageError;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use weft_core::TraceRecord;

/// The animator's input: one [`TraceRecord`] per line.
pub struct TraceLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl TraceLog {
    pub fn open(path: &Path) -> Result<TraceLog, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| StorageError::Open { path: path.to_path_buf(), source })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StorageError::Open { path: path.to_path_buf(), source })?;
        Ok(TraceLog { path: path.to_path_buf(), writer: BufWriter::new(file) })
    }

    pub fn append(&mut self, record: &TraceRecord) -> Result<(), StorageError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StorageError> {
        Ok(self.writer.flush()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_all(path: &Path) -> Result<Vec<TraceRecord>, StorageError> {
        let file = File::open(path)
            .map_err(|source| StorageError::Open { path: path.to_path_buf(), source })?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable trace record"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
#[path = "trace_log_tests.rs"]
mod tests;
