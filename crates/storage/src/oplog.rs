// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only operation log
//!
//! ```text
//! NewOperation → validate → OpLogEntry (seq, checksum) → fsync → oplog.jsonl
//! ```
//!
//! Each line is one entry carrying a CRC32 of its operation. On open, entries
//! are replayed into an in-memory index and the file is truncated after the
//! last valid entry (a crash mid-append leaves a partial line behind). A
//! failed append truncates its own partial line before reporting the error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stash_core::schema::mute_subject;
use stash_core::uri::is_did;
use stash_core::{namespace, payload, NewOperation, Operation, Seq, Stream};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default page size for scans
pub const DEFAULT_SCAN_LIMIT: usize = 100;
/// Upper bound on the page size for scans
pub const MAX_SCAN_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum OpLogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

/// One line of the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpLogEntry {
    pub stream: Stream,
    pub created_at: DateTime<Utc>,
    pub operation: Operation,
    /// CRC32 of the serialized operation
    pub checksum: u32,
}

impl OpLogEntry {
    pub fn new(operation: Operation, created_at: DateTime<Utc>) -> Self {
        Self {
            stream: operation.stream(),
            checksum: Self::calculate_checksum(&operation),
            created_at,
            operation,
        }
    }

    fn calculate_checksum(operation: &Operation) -> u32 {
        let json = serde_json::to_string(operation).unwrap_or_default();
        crc32fast::hash(json.as_bytes())
    }

    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(&self.operation)
            && self.stream == self.operation.stream()
    }
}

/// Append-only log of operations, optionally backed by a file
pub struct OpLog {
    path: Option<PathBuf>,
    file: Option<File>,
    /// Byte length of the file up to the end of the last entry
    valid_len: u64,
    /// A failed append could not be truncated away yet
    torn: bool,
    /// Entries in ascending `seq` order
    entries: Vec<OpLogEntry>,
}

impl OpLog {
    /// Open or create a log file, replaying its valid entries
    pub fn open(path: &Path) -> Result<Self, OpLogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (entries, valid_len) = if path.exists() {
            Self::replay(path)?
        } else {
            (Vec::new(), 0)
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        if file.metadata()?.len() > valid_len {
            tracing::warn!(
                path = %path.display(),
                valid_entries = entries.len(),
                "truncating operation log after last valid entry"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        Ok(Self {
            path: Some(path.to_path_buf()),
            file: Some(file),
            valid_len,
            torn: false,
            entries,
        })
    }

    /// A log that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            path: None,
            file: None,
            valid_len: 0,
            torn: false,
            entries: Vec::new(),
        }
    }

    /// Read valid entries and the byte length they occupy
    fn replay(path: &Path) -> Result<(Vec<OpLogEntry>, u64), OpLogError> {
        let contents = std::fs::read(path)?;
        let mut entries: Vec<OpLogEntry> = Vec::new();
        let mut valid_len = 0u64;
        let mut offset = 0u64;

        for line in contents.split_inclusive(|&b| b == b'\n') {
            offset += line.len() as u64;
            // A torn write may end without a newline or mid-character
            let Some(Ok(text)) = line.strip_suffix(b"\n").map(std::str::from_utf8) else {
                break;
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                valid_len = offset;
                continue;
            }

            let Ok(entry) = serde_json::from_str::<OpLogEntry>(trimmed) else {
                break;
            };
            let in_order = entries
                .last()
                .map_or(true, |last| last.operation.seq < entry.operation.seq);
            if !entry.verify() || !in_order {
                break;
            }

            entries.push(entry);
            valid_len = offset;
        }

        Ok((entries, valid_len))
    }

    /// Check an operation the way the log service does before accepting it
    pub fn validate(op: &NewOperation) -> Result<(), OpLogError> {
        if !namespace::is_valid(&op.namespace) {
            return Err(OpLogError::InvalidOperation(
                "operation namespace is invalid NSID",
            ));
        }
        if !is_did(&op.actor) {
            return Err(OpLogError::InvalidOperation("operation actor is invalid DID"));
        }
        if op.key.is_empty() {
            return Err(OpLogError::InvalidOperation("operation key is required"));
        }
        if let Some(Ok((_, body))) = op.payload.as_deref().map(payload::decode_value) {
            if mute_subject(&op.namespace, &body).is_some_and(|subject| subject != op.key) {
                return Err(OpLogError::InvalidOperation("mute key must equal its subject"));
            }
        }
        match (op.method.has_payload(), op.payload.is_some()) {
            (false, true) => Err(OpLogError::InvalidOperation(
                "cannot specify a payload when method is DELETE",
            )),
            (true, false) => Err(OpLogError::InvalidOperation(
                "payload is required when method is CREATE or UPDATE",
            )),
            _ => Ok(()),
        }
    }

    /// Append an operation, assigning it the next sequence number
    ///
    /// The entry is durably persisted (fsync'd) before this returns.
    pub fn append(&mut self, op: NewOperation) -> Result<Operation, OpLogError> {
        Self::validate(&op)?;

        let operation = op.with_seq(self.last_seq().unwrap_or(0) + 1);
        let entry = OpLogEntry::new(operation.clone(), Utc::now());

        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        self.persist(&line)?;

        self.entries.push(entry);
        Ok(operation)
    }

    /// Write and fsync one line. On failure the file is cut back to the
    /// last entry so a later append does not land behind a partial line.
    fn persist(&mut self, line: &[u8]) -> Result<(), OpLogError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        if self.torn {
            file.set_len(self.valid_len)?;
            self.torn = false;
        }

        if let Err(e) = file.write_all(line).and_then(|()| file.sync_all()) {
            if let Err(truncate) = file.set_len(self.valid_len) {
                tracing::error!(
                    error = %truncate,
                    valid_len = self.valid_len,
                    "failed to truncate partial log entry"
                );
                self.torn = true;
            }
            return Err(e.into());
        }

        self.valid_len += line.len() as u64;
        Ok(())
    }

    /// Operations of `stream` with `seq` strictly greater than `after`
    pub fn scan(&self, stream: Stream, after: Option<Seq>, limit: usize) -> Vec<Operation> {
        let after = after.unwrap_or(0);
        let start = self
            .entries
            .partition_point(|entry| entry.operation.seq <= after);

        self.entries[start..]
            .iter()
            .filter(|entry| entry.stream == stream)
            .take(limit.clamp(1, MAX_SCAN_LIMIT))
            .map(|entry| entry.operation.clone())
            .collect()
    }

    /// Highest sequence number in the log
    pub fn last_seq(&self) -> Option<Seq> {
        self.entries.last().map(|entry| entry.operation.seq)
    }

    /// Highest sequence number within one stream
    pub fn head(&self, stream: Stream) -> Option<Seq> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.stream == stream)
            .map(|entry| entry.operation.seq)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
#[path = "oplog_tests.rs"]
mod tests;
