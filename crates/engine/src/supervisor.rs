// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restarts a consumer whose streams halted

use crate::consumer::ReplicationConsumer;
use stash_adapters::LogService;
use stash_core::{Clock, Stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Periodically checks for halted streams and restarts the consumer from
/// its retained cursors
pub struct Supervisor<L, C> {
    consumer: Arc<ReplicationConsumer<L, C>>,
    interval: Duration,
}

impl<L: LogService, C: Clock> Supervisor<L, C> {
    pub fn new(consumer: Arc<ReplicationConsumer<L, C>>, interval: Duration) -> Self {
        Self { consumer, interval }
    }

    /// Restart the consumer if any stream halted. Returns the streams that
    /// were halted.
    pub async fn check(&self) -> Vec<Stream> {
        if !self.consumer.is_running() {
            return Vec::new();
        }
        let halted = self.consumer.halted_streams();
        if halted.is_empty() {
            return halted;
        }

        tracing::warn!(streams = ?halted, "restarting consumer after halted streams");
        self.consumer.restart().await;
        halted
    }

    /// Run checks until `shutdown` turns true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    self.check().await;
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("supervisor stopped");
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
