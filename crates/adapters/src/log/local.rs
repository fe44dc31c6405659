// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log service backed by a local operation log

use super::{LogError, LogService, ScanPage};
use async_trait::async_trait;
use stash_core::{NewOperation, Operation, Seq, Stream};
use stash_storage::{OpLog, OpLogError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

impl From<OpLogError> for LogError {
    fn from(e: OpLogError) -> Self {
        match e {
            OpLogError::InvalidOperation(msg) => LogError::InvalidOperation(msg.to_string()),
            other => LogError::Unavailable(other.to_string()),
        }
    }
}

/// Log service over an [`OpLog`], shared by writers and readers in-process
///
/// A scan that finds nothing waits up to the long-poll timeout for a put on
/// the same stream before returning an empty page.
#[derive(Clone)]
pub struct LocalLogService {
    log: Arc<Mutex<OpLog>>,
    signals: Arc<HashMap<Stream, Notify>>,
    long_poll: Duration,
}

impl LocalLogService {
    pub fn new(log: OpLog) -> Self {
        Self {
            log: Arc::new(Mutex::new(log)),
            signals: Arc::new(Stream::ALL.iter().map(|s| (*s, Notify::new())).collect()),
            long_poll: Duration::ZERO,
        }
    }

    /// Open a file-backed log
    pub fn open(path: &Path) -> Result<Self, LogError> {
        Ok(Self::new(OpLog::open(path)?))
    }

    pub fn in_memory() -> Self {
        Self::new(OpLog::in_memory())
    }

    pub fn with_long_poll(mut self, timeout: Duration) -> Self {
        self.long_poll = timeout;
        self
    }

    /// Highest `seq` currently in `stream`
    pub fn head(&self, stream: Stream) -> Option<Seq> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).head(stream)
    }

    fn read(&self, stream: Stream, cursor: Option<Seq>, limit: usize) -> ScanPage {
        let operations = self
            .log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .scan(stream, cursor, limit);
        ScanPage::new(operations, cursor)
    }
}

#[async_trait]
impl LogService for LocalLogService {
    async fn put(&self, op: NewOperation) -> Result<Operation, LogError> {
        let stream = op.stream();
        let stored = self
            .log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .append(op)?;

        if let Some(signal) = self.signals.get(&stream) {
            signal.notify_waiters();
        }
        Ok(stored)
    }

    async fn scan(
        &self,
        stream: Stream,
        cursor: Option<Seq>,
        limit: usize,
    ) -> Result<ScanPage, LogError> {
        let Some(signal) = self.signals.get(&stream) else {
            return Ok(self.read(stream, cursor, limit));
        };

        // Register interest before reading so a put between the read and
        // the wait is not missed
        let notified = signal.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let page = self.read(stream, cursor, limit);
        if !page.is_empty() || self.long_poll.is_zero() {
            return Ok(page);
        }

        if tokio::time::timeout(self.long_poll, notified).await.is_err() {
            return Ok(page);
        }
        Ok(self.read(stream, cursor, limit))
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
