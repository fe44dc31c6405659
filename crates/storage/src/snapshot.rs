// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time JSON image of the store
//!
//! A snapshot plus its replication cursors is enough to resume a replica
//! without replaying the log from the beginning.

use crate::tables::{
    ActivitySubscriptionRow, ActorRow, ActorStateRow, BookmarkRow, DraftRow, MuteKind,
    MuteRow, PostAggRow, PrivateDataRow, Tables,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stash_core::{Seq, Stream};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Format version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cursors: BTreeMap<Stream, Seq>,
    #[serde(default)]
    pub private_data: Vec<PrivateDataRow>,
    #[serde(default)]
    pub bookmarks: Vec<BookmarkRow>,
    #[serde(default)]
    pub post_aggs: Vec<PostAggRow>,
    #[serde(default)]
    pub drafts: Vec<DraftRow>,
    #[serde(default)]
    pub activity_subscriptions: Vec<ActivitySubscriptionRow>,
    #[serde(default)]
    pub actors: Vec<ActorRow>,
    #[serde(default)]
    pub actor_states: Vec<ActorStateRow>,
    #[serde(default)]
    pub mutes: Vec<MuteRow>,
    #[serde(default)]
    pub list_mutes: Vec<MuteRow>,
    #[serde(default)]
    pub thread_mutes: Vec<MuteRow>,
}

fn rows<K, V: Clone>(table: &BTreeMap<K, V>) -> Vec<V> {
    table.values().cloned().collect()
}

impl Snapshot {
    pub fn capture(tables: &Tables, created_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at,
            cursors: tables.cursors.clone(),
            private_data: rows(&tables.private_data),
            bookmarks: rows(&tables.bookmarks),
            post_aggs: rows(&tables.post_aggs),
            drafts: rows(&tables.drafts),
            activity_subscriptions: rows(&tables.activity_subscriptions),
            actors: rows(&tables.actors),
            actor_states: rows(&tables.actor_states),
            mutes: rows(&tables.mutes),
            list_mutes: rows(&tables.list_mutes),
            thread_mutes: rows(&tables.thread_mutes),
        }
    }

    /// Rebuild tables from the snapshot rows
    pub fn restore(self) -> Tables {
        let mut tables = Tables {
            cursors: self.cursors,
            ..Tables::default()
        };
        for row in self.private_data {
            tables.upsert_private_data(row);
        }
        for row in self.bookmarks {
            tables.upsert_bookmark(row);
        }
        for row in self.post_aggs {
            tables.post_aggs.insert(row.uri.clone(), row);
        }
        for row in self.drafts {
            tables.upsert_draft(row);
        }
        for row in self.activity_subscriptions {
            tables.upsert_activity_subscription(row);
        }
        for row in self.actors {
            tables.insert_actor(row);
        }
        for row in self.actor_states {
            tables.actor_states.insert(row.did.clone(), row);
        }
        for (kind, table) in [
            (MuteKind::Actor, self.mutes),
            (MuteKind::List, self.list_mutes),
            (MuteKind::Thread, self.thread_mutes),
        ] {
            for row in table {
                tables.insert_mute(kind, row);
            }
        }
        tables
    }

    /// Write atomically: serialize to a sibling temp file, then rename
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "wrote snapshot");
        Ok(())
    }

    /// Load a snapshot. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(snapshot.version));
        }
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
