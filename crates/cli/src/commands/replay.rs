// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stash replay`: catch the replica up to the log head once

use super::{open_log, open_replica, save_snapshot};
use crate::config::Config;
use crate::output::{self, OutputFormat};
use serde::Serialize;
use stash_storage::Snapshot;
use std::fmt;

/// Projected store after a replay
#[derive(Serialize)]
pub struct ReplayReport {
    #[serde(flatten)]
    snapshot: Snapshot,
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.snapshot;
        writeln!(f, "{:<24} ROWS", "TABLE")?;
        let counts = [
            ("private_data", s.private_data.len()),
            ("bookmark", s.bookmarks.len()),
            ("post_agg", s.post_aggs.len()),
            ("draft", s.drafts.len()),
            ("activity_subscription", s.activity_subscriptions.len()),
            ("actor", s.actors.len()),
            ("actor_state", s.actor_states.len()),
            ("mute", s.mutes.len()),
            ("list_mute", s.list_mutes.len()),
            ("thread_mute", s.thread_mutes.len()),
        ];
        for (table, rows) in counts {
            writeln!(f, "{:<24} {}", table, rows)?;
        }
        if s.cursors.is_empty() {
            write!(f, "cursors: none")
        } else {
            let cursors: Vec<String> = s
                .cursors
                .iter()
                .map(|(stream, seq)| format!("{}={}", stream, seq))
                .collect();
            write!(f, "cursors: {}", cursors.join(" "))
        }
    }
}

pub async fn handle(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let log = open_log(config, config.consumer.long_poll)?;
    let consumer = open_replica(config, log.clone())?;

    consumer.start().await;
    for stream in &config.consumer.streams {
        let Some(head) = log.inner().head(*stream) else {
            continue;
        };
        if consumer.cursor(*stream).is_some_and(|cursor| cursor >= head) {
            continue;
        }
        tracing::info!(%stream, head, "catching up");
        if let Err(e) = consumer.catch_up(*stream, head).await {
            consumer.destroy().await;
            return Err(e.into());
        }
    }
    consumer.destroy().await;

    let snapshot = save_snapshot(config, &consumer)?;
    output::print(&ReplayReport { snapshot }, format)
}
