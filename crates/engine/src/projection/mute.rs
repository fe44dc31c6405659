// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actor, list and thread mutes

use super::{require_payload, ProjectionHandler};
use crate::error::ProjectionError;
use chrono::{DateTime, Utc};
use stash_core::records::Mute;
use stash_core::uri::{is_did, AtUri};
use stash_core::{namespace, payload, Method, Operation};
use stash_storage::tables::MuteRow;
use stash_storage::{Database, MuteKind};

/// Classify a mute subject: DIDs are accounts, list URIs are lists and any
/// other URI is a thread root
pub fn mute_kind(subject: &str) -> Result<MuteKind, ProjectionError> {
    if is_did(subject) {
        return Ok(MuteKind::Actor);
    }
    let uri = AtUri::parse(subject)?;
    if uri.collection() == Some(namespace::LIST_COLLECTION) {
        Ok(MuteKind::List)
    } else {
        Ok(MuteKind::Thread)
    }
}

/// Mutes are keyed by subject. CREATE/UPDATE add the mute (keeping an
/// existing one), DELETE removes it. An operation whose key is not its
/// subject is rejected, so every stored mute stays reachable by DELETE.
pub struct MuteHandler;

impl ProjectionHandler for MuteHandler {
    fn apply(
        &self,
        db: &Database,
        op: &Operation,
        now: DateTime<Utc>,
    ) -> Result<(), ProjectionError> {
        match op.method {
            Method::Create | Method::Update => {
                let mute: Mute = payload::decode(&op.namespace, Some(require_payload(op)?))?;
                if mute.subject != op.key {
                    return Err(ProjectionError::KeyMismatch {
                        key: op.key.clone(),
                        subject: mute.subject,
                    });
                }
                let kind = mute_kind(&mute.subject)?;
                db.write().insert_mute(
                    kind,
                    MuteRow {
                        muted_by: op.actor.clone(),
                        subject: mute.subject,
                        created_at: now,
                    },
                );
            }
            Method::Delete => {
                // A key that is no valid subject never produced a mute
                let Ok(kind) = mute_kind(&op.key) else {
                    tracing::debug!(actor = %op.actor, key = %op.key, "no mute for key");
                    return Ok(());
                };
                db.write().delete_mute(kind, &op.actor, &op.key);
            }
        }
        Ok(())
    }
}

/// Removes every actor and list mute of the actor. Thread mutes are kept.
pub struct MuteClearHandler;

impl ProjectionHandler for MuteClearHandler {
    fn apply(
        &self,
        db: &Database,
        op: &Operation,
        _now: DateTime<Utc>,
    ) -> Result<(), ProjectionError> {
        if op.method != Method::Create {
            return Ok(());
        }
        db.transaction(|tables| {
            let actors = tables.clear_mutes(MuteKind::Actor, &op.actor);
            let lists = tables.clear_mutes(MuteKind::List, &op.actor);
            tracing::debug!(actor = %op.actor, actors, lists, "cleared mutes");
            Ok(())
        })
    }
}
