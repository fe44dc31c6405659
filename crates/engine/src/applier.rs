// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background application of replicated batches
//!
//! One worker per stream drains an unbounded queue of batches in enqueue
//! order. Application never blocks the poller that enqueued the batch.

use crate::projection::ProjectionEngine;
use stash_core::{Clock, Operation, Seq, Stream};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

/// A unit of work: one scan page of one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub stream: Stream,
    pub operations: Vec<Operation>,
    /// Stream position reached once the batch is applied
    pub cursor: Option<Seq>,
}

struct ApplierInner<C> {
    engine: ProjectionEngine<C>,
    workers: Mutex<HashMap<Stream, mpsc::UnboundedSender<Batch>>>,
    pending: AtomicUsize,
    idle: Notify,
}

/// Per-stream FIFO applier, cloneable and shared between consumer restarts
#[derive(Clone)]
pub struct BackgroundApplier<C> {
    inner: Arc<ApplierInner<C>>,
}

impl<C: Clock> BackgroundApplier<C> {
    pub fn new(engine: ProjectionEngine<C>) -> Self {
        Self {
            inner: Arc::new(ApplierInner {
                engine,
                workers: Mutex::new(HashMap::new()),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    pub fn engine(&self) -> &ProjectionEngine<C> {
        &self.inner.engine
    }

    /// Queue a batch and return immediately
    ///
    /// Must be called from within a tokio runtime; the stream's worker is
    /// spawned on first use.
    pub fn enqueue(&self, batch: Batch) {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);

        let mut workers = self
            .inner
            .workers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let stream = batch.stream;
        let tx = workers
            .entry(stream)
            .or_insert_with(|| self.spawn_worker(stream));

        if let Err(mpsc::error::SendError(batch)) = tx.send(batch) {
            // Worker is gone; replace it and retry once
            let tx = self.spawn_worker(stream);
            if tx.send(batch).is_err() {
                tracing::error!(%stream, "applier worker unavailable, dropping batch");
                self.inner.finish_one();
            }
            workers.insert(stream, tx);
        }
    }

    fn spawn_worker(&self, stream: Stream) -> mpsc::UnboundedSender<Batch> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Batch>();
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            tracing::debug!(%stream, "applier worker started");
            while let Some(batch) = rx.recv().await {
                inner.apply_batch(batch);
                inner.finish_one();
            }
            tracing::debug!(%stream, "applier worker stopped");
        });

        tx
    }

    /// Number of batches accepted but not yet applied
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Wait until every accepted batch has been applied
    pub async fn drain(&self) {
        loop {
            let idle = self.inner.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            idle.await;
        }
    }
}

impl<C: Clock> ApplierInner<C> {
    fn apply_batch(&self, batch: Batch) {
        let span = tracing::debug_span!(
            "applier.batch",
            stream = %batch.stream,
            count = batch.operations.len(),
            cursor = batch.cursor,
        );
        let _guard = span.enter();

        let mut failed = 0usize;
        for op in &batch.operations {
            // A panicking handler must not take the stream's worker down
            let error = match panic::catch_unwind(AssertUnwindSafe(|| self.engine.apply(op))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => format!("handler panicked: {}", panic_message(&*panic)),
            };
            failed += 1;
            tracing::error!(
                seq = op.seq,
                actor = %op.actor,
                namespace = %op.namespace,
                key = %op.key,
                method = %op.method,
                error = %error,
                "failed to apply operation"
            );
        }

        if let Some(cursor) = batch.cursor {
            self.engine.db().write().advance_cursor(batch.stream, cursor);
        }
        tracing::debug!(failed, "batch applied");
    }

    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
#[path = "applier_tests.rs"]
mod tests;
