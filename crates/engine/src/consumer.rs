// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replication consumer: polls each stream and hands pages to the applier
//!
//! ```text
//! loop per stream:
//!   shutdown? → stop
//!   scan(stream, cursor) ─err→ log, halt stream
//!                        └ok→ enqueue batch, advance cursor (no waiting)
//! ```

use crate::applier::{BackgroundApplier, Batch};
use crate::error::ConsumerError;
use serde::{Deserialize, Serialize};
use stash_adapters::LogService;
use stash_core::{Clock, Seq, Stream};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Consumer tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Streams to follow
    pub streams: Vec<Stream>,
    /// Page size requested per scan
    pub batch_limit: usize,
    /// Pause after an empty page before polling again
    #[serde(with = "humantime_serde")]
    pub idle_backoff: Duration,
    /// How long a local log scan may wait for new operations
    #[serde(with = "humantime_serde")]
    pub long_poll: Duration,
    /// How often the supervisor looks for halted streams
    #[serde(with = "humantime_serde")]
    pub supervise_interval: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            streams: Stream::ALL.to_vec(),
            batch_limit: 100,
            idle_backoff: Duration::from_millis(250),
            long_poll: Duration::from_secs(5),
            supervise_interval: Duration::from_secs(5),
        }
    }
}

/// Observable state of one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStatus {
    /// Last polled position (batches up to here are queued or applied)
    pub cursor: Option<Seq>,
    /// Polling stopped after a scan failure
    pub halted: bool,
}

struct Running {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

/// Follows the log and keeps the local store up to date
///
/// Cursor state belongs to the instance and survives `shutdown`/`start`.
pub struct ReplicationConsumer<L, C> {
    log: L,
    applier: BackgroundApplier<C>,
    config: ConsumerConfig,
    status: BTreeMap<Stream, Arc<watch::Sender<StreamStatus>>>,
    running: tokio::sync::Mutex<Option<Running>>,
    started: AtomicBool,
}

impl<L: LogService, C: Clock> ReplicationConsumer<L, C> {
    pub fn new(log: L, applier: BackgroundApplier<C>, config: ConsumerConfig) -> Self {
        let status = Stream::ALL
            .iter()
            .map(|stream| (*stream, Arc::new(watch::channel(StreamStatus::default()).0)))
            .collect();
        Self {
            log,
            applier,
            config,
            status,
            running: tokio::sync::Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Resume from previously recorded cursors (e.g. the store's cursor table)
    pub fn with_cursors(self, cursors: &BTreeMap<Stream, Seq>) -> Self {
        for (stream, cursor) in cursors {
            if let Some(status) = self.status.get(stream) {
                status.send_modify(|s| s.cursor = Some(*cursor));
            }
        }
        self
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    pub fn applier(&self) -> &BackgroundApplier<C> {
        &self.applier
    }

    /// Start one polling task per configured stream. No-op when running.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::debug!("consumer already running");
            return;
        }

        let (shutdown, _) = watch::channel(false);
        let mut tasks = Vec::with_capacity(self.config.streams.len());
        for stream in &self.config.streams {
            let Some(status) = self.status.get(stream) else {
                continue;
            };
            status.send_modify(|s| s.halted = false);

            let poller = Poller {
                stream: *stream,
                log: self.log.clone(),
                applier: self.applier.clone(),
                status: Arc::clone(status),
                shutdown: shutdown.subscribe(),
                limit: self.config.batch_limit,
                idle_backoff: self.config.idle_backoff,
            };
            tasks.push(tokio::spawn(poller.run()));
        }

        tracing::info!(streams = ?self.config.streams, "consumer started");
        *running = Some(Running { shutdown, tasks });
        self.started.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Signal every poller to stop and wait for them to exit
    ///
    /// Batches already handed to the applier still complete; use
    /// [`Self::process_all`] to wait for them.
    pub async fn shutdown(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        self.started.store(false, Ordering::SeqCst);

        let _ = running.shutdown.send(true);
        for task in running.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "poller task failed");
            }
        }
        tracing::info!("consumer stopped");
    }

    /// Wait for every accepted batch to be applied. Polling continues.
    pub async fn process_all(&self) {
        self.applier.drain().await;
    }

    /// Shut down, then drain
    pub async fn destroy(&self) {
        self.shutdown().await;
        self.process_all().await;
    }

    /// Tear down and start again from the retained cursors
    pub async fn restart(&self) {
        self.destroy().await;
        self.start().await;
    }

    pub fn status(&self, stream: Stream) -> StreamStatus {
        self.status
            .get(&stream)
            .map(|status| *status.borrow())
            .unwrap_or_default()
    }

    pub fn cursor(&self, stream: Stream) -> Option<Seq> {
        self.status(stream).cursor
    }

    pub fn cursors(&self) -> BTreeMap<Stream, Seq> {
        self.status
            .iter()
            .filter_map(|(stream, status)| status.borrow().cursor.map(|c| (*stream, c)))
            .collect()
    }

    /// Streams whose polling stopped after a scan failure
    pub fn halted_streams(&self) -> Vec<Stream> {
        self.status
            .iter()
            .filter(|(_, status)| status.borrow().halted)
            .map(|(stream, _)| *stream)
            .collect()
    }

    /// Wait until `stream` has been polled up to `seq`, then drain
    ///
    /// Fails with [`ConsumerError::NotFollowing`] if the consumer is shut
    /// down while waiting.
    pub async fn catch_up(&self, stream: Stream, seq: Seq) -> Result<(), ConsumerError> {
        if !self.config.streams.contains(&stream) {
            return Err(ConsumerError::NotFollowing(stream));
        }
        let Some(status) = self.status.get(&stream) else {
            return Err(ConsumerError::NotFollowing(stream));
        };
        let mut stopped = match self.running.lock().await.as_ref() {
            Some(running) => running.shutdown.subscribe(),
            None => return Err(ConsumerError::NotFollowing(stream)),
        };

        let mut rx = status.subscribe();
        let reached = tokio::select! {
            biased;
            result = rx.wait_for(|s| s.halted || s.cursor.is_some_and(|c| c >= seq)) => {
                result.map(|s| !s.halted).unwrap_or(false)
            }
            _ = stopped.wait_for(|stop| *stop) => {
                tracing::debug!(%stream, seq, "consumer stopped before catching up");
                return Err(ConsumerError::NotFollowing(stream));
            }
        };
        if !reached {
            return Err(ConsumerError::Halted(stream));
        }

        self.process_all().await;
        Ok(())
    }
}

/// Polling loop of a single stream
struct Poller<L, C> {
    stream: Stream,
    log: L,
    applier: BackgroundApplier<C>,
    status: Arc<watch::Sender<StreamStatus>>,
    shutdown: watch::Receiver<bool>,
    limit: usize,
    idle_backoff: Duration,
}

impl<L: LogService, C: Clock> Poller<L, C> {
    async fn run(mut self) {
        let stream = self.stream;
        let mut cursor = self.status.borrow().cursor;
        tracing::debug!(%stream, cursor, "polling");

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let result = tokio::select! {
                result = self.log.scan(stream, cursor, self.limit) => result,
                _ = self.shutdown.changed() => break,
            };

            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(%stream, cursor, error = %e, "scan failed, halting stream");
                    self.status.send_modify(|s| s.halted = true);
                    break;
                }
            };

            if page.is_empty() {
                tokio::select! {
                    _ = tokio::time::sleep(self.idle_backoff) => continue,
                    _ = self.shutdown.changed() => break,
                }
            }

            tracing::debug!(
                %stream,
                count = page.operations.len(),
                cursor = page.cursor,
                "enqueueing batch"
            );
            self.applier.enqueue(Batch {
                stream,
                operations: page.operations,
                cursor: page.cursor,
            });
            cursor = page.cursor;
            self.status.send_modify(|s| s.cursor = cursor);
        }

        tracing::debug!(%stream, cursor, "poller stopped");
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
