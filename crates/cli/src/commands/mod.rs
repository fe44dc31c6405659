// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod follow;
pub mod put;
pub mod replay;
pub mod scan;

use crate::config::Config;
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use stash_adapters::{LocalLogService, TracedLogService};
use stash_core::{payload, Clock, Method, Operation, Seq, Stream, SystemClock};
use stash_engine::{BackgroundApplier, ProjectionEngine, ReplicationConsumer};
use stash_storage::{Database, Snapshot};
use std::fmt;
use std::time::Duration;

pub type Log = TracedLogService<LocalLogService>;
pub type Consumer = ReplicationConsumer<Log, SystemClock>;

/// Open the configured operation log
pub fn open_log(config: &Config, long_poll: Duration) -> anyhow::Result<Log> {
    let log = LocalLogService::open(&config.log_path)
        .with_context(|| format!("failed to open log {}", config.log_path.display()))?
        .with_long_poll(long_poll);
    Ok(TracedLogService::new(log))
}

/// Build a replica over `log`, resuming from the configured snapshot
pub fn open_replica(config: &Config, log: Log) -> anyhow::Result<Consumer> {
    let tables = Snapshot::load(&config.snapshot_path)
        .with_context(|| format!("failed to load {}", config.snapshot_path.display()))?
        .map(Snapshot::restore)
        .unwrap_or_default();
    let cursors = tables.cursors.clone();
    if !cursors.is_empty() {
        tracing::info!(?cursors, "resuming from snapshot");
    }

    let engine = ProjectionEngine::builtin(Database::from_tables(tables), SystemClock);
    Ok(
        ReplicationConsumer::new(log, BackgroundApplier::new(engine), config.consumer.clone())
            .with_cursors(&cursors),
    )
}

/// Write the replica's store to the configured snapshot path
pub fn save_snapshot(config: &Config, consumer: &Consumer) -> anyhow::Result<Snapshot> {
    let tables = consumer.applier().engine().db().snapshot();
    let snapshot = Snapshot::capture(&tables, SystemClock.now());
    snapshot
        .save(&config.snapshot_path)
        .with_context(|| format!("failed to save {}", config.snapshot_path.display()))?;
    tracing::info!(path = %config.snapshot_path.display(), "snapshot saved");
    Ok(snapshot)
}

/// An operation as shown to the user, with its payload decoded
#[derive(Debug, Serialize)]
pub struct OperationView {
    pub seq: Seq,
    pub stream: Stream,
    pub method: Method,
    pub actor: String,
    pub namespace: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl From<&Operation> for OperationView {
    fn from(op: &Operation) -> Self {
        let payload = op
            .payload
            .as_deref()
            .and_then(|bytes| payload::decode_value(bytes).ok())
            .map(|(_, value)| value);
        Self {
            seq: op.seq,
            stream: op.stream(),
            method: op.method,
            actor: op.actor.clone(),
            namespace: op.namespace.clone(),
            key: op.key.clone(),
            payload,
        }
    }
}

impl fmt::Display for OperationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} {:<9} {:<6} {} {} {}",
            self.seq,
            self.stream.as_str(),
            self.method.as_str(),
            self.actor,
            self.namespace,
            self.key
        )?;
        if let Some(payload) = &self.payload {
            write!(f, " {}", payload)?;
        }
        Ok(())
    }
}
