// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tables of the replica's local relational store
//!
//! Each method is one statement: an upsert-on-conflict, a delete or a select.
//! Multi-statement work goes through [`crate::Database::transaction`], whose
//! [`crate::Transaction`] journals each write so it can be undone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stash_core::{Seq, Stream};
use std::collections::{BTreeMap, BTreeSet};

/// Generic projection of every record, keyed by (actor, namespace, key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateDataRow {
    pub actor: String,
    pub namespace: String,
    pub key: String,
    /// Most recent payload, verbatim
    pub payload: String,
    pub indexed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRow {
    pub creator: String,
    pub key: String,
    pub subject_uri: String,
    pub subject_cid: String,
    pub indexed_at: DateTime<Utc>,
}

/// Denormalized per-post aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAggRow {
    pub uri: String,
    pub bookmark_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRow {
    pub creator: String,
    pub key: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySubscriptionRow {
    pub creator: String,
    pub key: String,
    pub subject_did: String,
    pub post: bool,
    pub reply: bool,
    pub indexed_at: DateTime<Utc>,
}

/// An account known to the replica. Age-assurance fields are maintained from
/// the private-data log; the row itself is created elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRow {
    pub did: String,
    pub handle: Option<String>,
    pub age_assurance_status: Option<String>,
    pub age_assurance_last_initiated_at: Option<String>,
    pub age_assurance_access: Option<String>,
    pub age_assurance_country_code: Option<String>,
    pub age_assurance_region_code: Option<String>,
    pub indexed_at: DateTime<Utc>,
}

impl ActorRow {
    pub fn new(did: impl Into<String>, indexed_at: DateTime<Utc>) -> Self {
        Self {
            did: did.into(),
            handle: None,
            age_assurance_status: None,
            age_assurance_last_initiated_at: None,
            age_assurance_access: None,
            age_assurance_country_code: None,
            age_assurance_region_code: None,
            indexed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStateRow {
    pub did: String,
    pub priority_notifs: bool,
    pub last_seen_notifs: DateTime<Utc>,
}

/// What a mute targets, derived from the shape of its subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuteKind {
    /// An account, by DID
    Actor,
    /// A moderation list, by URI
    List,
    /// A thread, by root post URI
    Thread,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteRow {
    pub muted_by: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) type CreatorKey = (String, String);
type RecordKey = (String, String, String);

fn creator_key(creator: &str, key: &str) -> CreatorKey {
    (creator.to_string(), key.to_string())
}

/// Rows of a (creator, key) table belonging to one creator
fn owned_by<'a, V>(
    table: &'a BTreeMap<CreatorKey, V>,
    creator: &str,
) -> impl Iterator<Item = &'a V> + 'a {
    let creator = creator.to_string();
    table
        .range((creator.clone(), String::new())..)
        .take_while(move |((owner, _), _)| *owner == creator)
        .map(|(_, row)| row)
}

/// All tables of the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    pub private_data: BTreeMap<RecordKey, PrivateDataRow>,
    pub bookmarks: BTreeMap<CreatorKey, BookmarkRow>,
    /// Bookmark keys per subject URI, maintained alongside `bookmarks`
    pub(crate) bookmarks_by_subject: BTreeMap<String, BTreeSet<CreatorKey>>,
    pub post_aggs: BTreeMap<String, PostAggRow>,
    pub drafts: BTreeMap<CreatorKey, DraftRow>,
    pub activity_subscriptions: BTreeMap<CreatorKey, ActivitySubscriptionRow>,
    pub actors: BTreeMap<String, ActorRow>,
    pub actor_states: BTreeMap<String, ActorStateRow>,
    pub mutes: BTreeMap<CreatorKey, MuteRow>,
    pub list_mutes: BTreeMap<CreatorKey, MuteRow>,
    pub thread_mutes: BTreeMap<CreatorKey, MuteRow>,
    pub cursors: BTreeMap<Stream, Seq>,
}

impl Tables {
    // private_data

    /// Insert, or on conflict replace payload and `updated_at` (keeping `indexed_at`)
    pub fn upsert_private_data(&mut self, row: PrivateDataRow) {
        let key = (row.actor.clone(), row.namespace.clone(), row.key.clone());
        match self.private_data.get_mut(&key) {
            Some(existing) => {
                existing.payload = row.payload;
                existing.updated_at = row.updated_at;
            }
            None => {
                self.private_data.insert(key, row);
            }
        }
    }

    pub fn delete_private_data(&mut self, actor: &str, namespace: &str, key: &str) -> bool {
        self.private_data
            .remove(&(actor.to_string(), namespace.to_string(), key.to_string()))
            .is_some()
    }

    pub fn private_data(&self, actor: &str, namespace: &str, key: &str) -> Option<&PrivateDataRow> {
        self.private_data
            .get(&(actor.to_string(), namespace.to_string(), key.to_string()))
    }

    /// Records of one actor in one namespace, in key order
    pub fn private_data_for(&self, actor: &str, namespace: &str) -> Vec<&PrivateDataRow> {
        self.private_data
            .values()
            .filter(|row| row.actor == actor && row.namespace == namespace)
            .collect()
    }

    // bookmark + post_agg

    /// Insert or replace a bookmark. Returns the replaced row.
    pub fn upsert_bookmark(&mut self, row: BookmarkRow) -> Option<BookmarkRow> {
        let key = creator_key(&row.creator, &row.key);
        if let Some(previous) = self.bookmarks.get(&key) {
            if previous.subject_uri != row.subject_uri {
                let previous_uri = previous.subject_uri.clone();
                self.unindex_bookmark(&previous_uri, &key);
            }
        }
        self.bookmarks_by_subject
            .entry(row.subject_uri.clone())
            .or_default()
            .insert(key.clone());
        self.bookmarks.insert(key, row)
    }

    pub fn delete_bookmark(&mut self, creator: &str, key: &str) -> Option<BookmarkRow> {
        let key = creator_key(creator, key);
        let removed = self.bookmarks.remove(&key)?;
        self.unindex_bookmark(&removed.subject_uri, &key);
        Some(removed)
    }

    fn unindex_bookmark(&mut self, subject_uri: &str, key: &CreatorKey) {
        if let Some(keys) = self.bookmarks_by_subject.get_mut(subject_uri) {
            keys.remove(key);
            if keys.is_empty() {
                self.bookmarks_by_subject.remove(subject_uri);
            }
        }
    }

    pub fn bookmark(&self, creator: &str, key: &str) -> Option<&BookmarkRow> {
        self.bookmarks.get(&creator_key(creator, key))
    }

    pub fn bookmarks_by(&self, creator: &str) -> Vec<&BookmarkRow> {
        owned_by(&self.bookmarks, creator).collect()
    }

    /// Count bookmark rows referencing a subject
    pub fn count_bookmarks(&self, subject_uri: &str) -> u64 {
        self.bookmarks_by_subject
            .get(subject_uri)
            .map_or(0, |keys| keys.len() as u64)
    }

    pub fn set_bookmark_count(&mut self, uri: &str, count: u64) {
        self.post_aggs
            .entry(uri.to_string())
            .or_insert_with(|| PostAggRow {
                uri: uri.to_string(),
                bookmark_count: 0,
            })
            .bookmark_count = count;
    }

    pub fn bookmark_count(&self, uri: &str) -> u64 {
        self.post_aggs
            .get(uri)
            .map(|agg| agg.bookmark_count)
            .unwrap_or(0)
    }

    // draft

    /// Insert, or on conflict replace content and `updated_at` (keeping `created_at`)
    pub fn upsert_draft(&mut self, row: DraftRow) {
        match self.drafts.get_mut(&creator_key(&row.creator, &row.key)) {
            Some(existing) => {
                existing.payload = row.payload;
                existing.updated_at = row.updated_at;
            }
            None => {
                self.drafts.insert(creator_key(&row.creator, &row.key), row);
            }
        }
    }

    /// Update an existing draft. Returns false when there is no such draft.
    pub fn update_draft(
        &mut self,
        creator: &str,
        key: &str,
        payload: String,
        updated_at: DateTime<Utc>,
    ) -> bool {
        match self.drafts.get_mut(&creator_key(creator, key)) {
            Some(existing) => {
                existing.payload = payload;
                existing.updated_at = updated_at;
                true
            }
            None => false,
        }
    }

    pub fn delete_draft(&mut self, creator: &str, key: &str) -> bool {
        self.drafts.remove(&creator_key(creator, key)).is_some()
    }

    pub fn draft(&self, creator: &str, key: &str) -> Option<&DraftRow> {
        self.drafts.get(&creator_key(creator, key))
    }

    pub fn count_drafts(&self, creator: &str) -> usize {
        owned_by(&self.drafts, creator).count()
    }

    // activity_subscription

    pub fn upsert_activity_subscription(&mut self, row: ActivitySubscriptionRow) {
        self.activity_subscriptions
            .insert(creator_key(&row.creator, &row.key), row);
    }

    pub fn delete_activity_subscription(&mut self, creator: &str, key: &str) -> bool {
        self.activity_subscriptions
            .remove(&creator_key(creator, key))
            .is_some()
    }

    pub fn activity_subscription(&self, creator: &str, key: &str) -> Option<&ActivitySubscriptionRow> {
        self.activity_subscriptions.get(&creator_key(creator, key))
    }

    // actor

    /// Insert an actor if it is not known yet
    pub fn insert_actor(&mut self, row: ActorRow) {
        self.actors.entry(row.did.clone()).or_insert(row);
    }

    pub fn actor(&self, did: &str) -> Option<&ActorRow> {
        self.actors.get(did)
    }

    pub fn actor_mut(&mut self, did: &str) -> Option<&mut ActorRow> {
        self.actors.get_mut(did)
    }

    // actor_state

    /// Set notification priority, initialising `last_seen_notifs` for new rows
    pub fn upsert_priority_notifs(&mut self, did: &str, priority: bool, now: DateTime<Utc>) {
        self.actor_states
            .entry(did.to_string())
            .or_insert_with(|| ActorStateRow {
                did: did.to_string(),
                priority_notifs: priority,
                last_seen_notifs: now,
            })
            .priority_notifs = priority;
    }

    pub fn actor_state(&self, did: &str) -> Option<&ActorStateRow> {
        self.actor_states.get(did)
    }

    // mute, list_mute, thread_mute

    fn mute_table(&self, kind: MuteKind) -> &BTreeMap<CreatorKey, MuteRow> {
        match kind {
            MuteKind::Actor => &self.mutes,
            MuteKind::List => &self.list_mutes,
            MuteKind::Thread => &self.thread_mutes,
        }
    }

    fn mute_table_mut(&mut self, kind: MuteKind) -> &mut BTreeMap<CreatorKey, MuteRow> {
        match kind {
            MuteKind::Actor => &mut self.mutes,
            MuteKind::List => &mut self.list_mutes,
            MuteKind::Thread => &mut self.thread_mutes,
        }
    }

    /// Insert a mute; on conflict do nothing
    pub fn insert_mute(&mut self, kind: MuteKind, row: MuteRow) {
        self.mute_table_mut(kind)
            .entry(creator_key(&row.muted_by, &row.subject))
            .or_insert(row);
    }

    pub fn delete_mute(&mut self, kind: MuteKind, muted_by: &str, subject: &str) -> bool {
        self.mute_table_mut(kind)
            .remove(&creator_key(muted_by, subject))
            .is_some()
    }

    /// Remove every mute of one kind held by an actor
    pub fn clear_mutes(&mut self, kind: MuteKind, muted_by: &str) -> usize {
        let table = self.mute_table_mut(kind);
        let before = table.len();
        table.retain(|(owner, _), _| owner != muted_by);
        before - table.len()
    }

    pub fn is_muted(&self, kind: MuteKind, muted_by: &str, subject: &str) -> bool {
        self.mute_table(kind)
            .contains_key(&creator_key(muted_by, subject))
    }

    pub fn mutes_by(&self, kind: MuteKind, muted_by: &str) -> Vec<&MuteRow> {
        owned_by(self.mute_table(kind), muted_by).collect()
    }

    // replication_cursor

    /// Record a stream cursor. Cursors never move backwards.
    pub fn advance_cursor(&mut self, stream: Stream, seq: Seq) {
        let cursor = self.cursors.entry(stream).or_insert(seq);
        *cursor = (*cursor).max(seq);
    }

    pub fn cursor(&self, stream: Stream) -> Option<Seq> {
        self.cursors.get(&stream).copied()
    }
}

#[cfg(test)]
#[path = "tables_tests.rs"]
mod tests;
