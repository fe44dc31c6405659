// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake log service for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LogError, LogService, ScanPage};
use async_trait::async_trait;
use stash_core::{NewOperation, Operation, Seq, Stream};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded log service call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogCall {
    Put { op: NewOperation },
    Scan { stream: Stream, cursor: Option<Seq> },
}

#[derive(Default)]
struct FakeLogState {
    operations: Vec<Operation>,
    calls: Vec<LogCall>,
    put_error: Option<LogError>,
    scan_errors: HashMap<Stream, LogError>,
}

/// In-memory log service that records every call
///
/// Puts are not validated, so tests can inject operations a real log would
/// reject.
#[derive(Clone, Default)]
pub struct FakeLogService {
    state: Arc<Mutex<FakeLogState>>,
}

impl FakeLogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<LogCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Recorded puts only
    pub fn puts(&self) -> Vec<NewOperation> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                LogCall::Put { op } => Some(op),
                LogCall::Scan { .. } => None,
            })
            .collect()
    }

    /// Number of scans issued for a stream
    pub fn scan_count(&self, stream: Stream) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, LogCall::Scan { stream: s, .. } if *s == stream))
            .count()
    }

    /// Every stored operation, in `seq` order
    pub fn operations(&self) -> Vec<Operation> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .operations
            .clone()
    }

    /// Make every subsequent put fail
    pub fn fail_puts(&self, error: LogError) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).put_error = Some(error);
    }

    /// Make every subsequent scan of `stream` fail
    pub fn fail_scans(&self, stream: Stream, error: LogError) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .scan_errors
            .insert(stream, error);
    }

    /// Let scans of `stream` succeed again
    pub fn heal(&self, stream: Stream) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .scan_errors
            .remove(&stream);
    }
}

#[async_trait]
impl LogService for FakeLogService {
    async fn put(&self, op: NewOperation) -> Result<Operation, LogError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(LogCall::Put { op: op.clone() });

        if let Some(error) = &state.put_error {
            return Err(error.clone());
        }

        let seq = state.operations.last().map_or(0, |last| last.seq) + 1;
        let stored = op.with_seq(seq);
        state.operations.push(stored.clone());
        Ok(stored)
    }

    async fn scan(
        &self,
        stream: Stream,
        cursor: Option<Seq>,
        limit: usize,
    ) -> Result<ScanPage, LogError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(LogCall::Scan { stream, cursor });

        if let Some(error) = state.scan_errors.get(&stream) {
            return Err(error.clone());
        }

        let after = cursor.unwrap_or(0);
        let operations = state
            .operations
            .iter()
            .filter(|op| op.seq > after && op.stream() == stream)
            .take(limit.max(1))
            .cloned()
            .collect();
        Ok(ScanPage::new(operations, cursor))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
