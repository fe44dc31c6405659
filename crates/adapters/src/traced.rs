// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::log::{LogError, LogService, ScanPage};
use async_trait::async_trait;
use stash_core::{NewOperation, Operation, Seq, Stream};
use tracing::Instrument;

/// Wrapper that adds tracing to any LogService
#[derive(Clone)]
pub struct TracedLogService<L> {
    inner: L,
}

impl<L> TracedLogService<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LogService> LogService for TracedLogService<L> {
    async fn put(&self, op: NewOperation) -> Result<Operation, LogError> {
        let span = tracing::info_span!(
            "log.put",
            actor = %op.actor,
            namespace = %op.namespace,
            key = %op.key,
            method = %op.method,
        );

        async move {
            tracing::debug!(
                payload_len = op.payload.as_ref().map(|p| p.len()),
                "submitting"
            );

            let start = std::time::Instant::now();
            let result = self.inner.put(op).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(stored) => tracing::info!(
                    seq = stored.seq,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "operation stored"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "put failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn scan(
        &self,
        stream: Stream,
        cursor: Option<Seq>,
        limit: usize,
    ) -> Result<ScanPage, LogError> {
        let span = tracing::debug_span!("log.scan", %stream, cursor, limit);

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.scan(stream, cursor, limit).await;
            let elapsed = start.elapsed();

            // Empty polls are routine
            match &result {
                Ok(page) if page.is_empty() => tracing::trace!("no new operations"),
                Ok(page) => tracing::debug!(
                    count = page.operations.len(),
                    next_cursor = page.cursor,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "scanned"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "scan failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
