// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log service adapters

mod local;

pub use local::LocalLogService;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLogService, LogCall};

use async_trait::async_trait;
use stash_core::{NewOperation, Operation, Seq, Stream};
use thiserror::Error;

/// Errors from log service calls
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogError {
    /// The log refused the operation
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Transport or storage failure
    #[error("log unavailable: {0}")]
    Unavailable(String),
    /// An entry could not be decoded (e.g. an unknown method)
    #[error("malformed log entry: {0}")]
    Malformed(String),
}

/// One page of a stream scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Operations in ascending `seq` order
    pub operations: Vec<Operation>,
    /// Last returned `seq`, or the requested cursor when the page is empty
    pub cursor: Option<Seq>,
}

impl ScanPage {
    pub fn new(operations: Vec<Operation>, requested: Option<Seq>) -> Self {
        let cursor = operations.last().map(|op| op.seq).or(requested);
        Self { operations, cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// The shared, durable, totally-ordered operation log
#[async_trait]
pub trait LogService: Clone + Send + Sync + 'static {
    /// Durably append an operation and return it with its assigned `seq`
    async fn put(&self, op: NewOperation) -> Result<Operation, LogError>;

    /// Operations of `stream` with `seq` strictly greater than `cursor`
    ///
    /// Re-reading from the same cursor returns the same operations.
    async fn scan(
        &self,
        stream: Stream,
        cursor: Option<Seq>,
        limit: usize,
    ) -> Result<ScanPage, LogError>;
}
