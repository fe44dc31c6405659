// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drafts

use super::{require_payload, ProjectionHandler};
use crate::error::ProjectionError;
use chrono::{DateTime, Utc};
use stash_core::records::Draft;
use stash_core::{payload, Method, Operation};
use stash_storage::tables::DraftRow;
use stash_storage::Database;

/// An UPDATE for a draft the replica has never seen is dropped.
pub struct DraftHandler;

impl ProjectionHandler for DraftHandler {
    fn apply(
        &self,
        db: &Database,
        op: &Operation,
        now: DateTime<Utc>,
    ) -> Result<(), ProjectionError> {
        match op.method {
            Method::Create => {
                let draft = decode(op)?;
                db.write().upsert_draft(DraftRow {
                    creator: op.actor.clone(),
                    key: op.key.clone(),
                    payload: draft,
                    created_at: now,
                    updated_at: now,
                });
            }
            Method::Update => {
                let draft = decode(op)?;
                if !db.write().update_draft(&op.actor, &op.key, draft, now) {
                    tracing::debug!(
                        actor = %op.actor,
                        key = %op.key,
                        "ignoring update of unknown draft"
                    );
                }
            }
            Method::Delete => {
                db.write().delete_draft(&op.actor, &op.key);
            }
        }
        Ok(())
    }
}

/// Check the payload decodes as a draft, returning it as stored text
fn decode(op: &Operation) -> Result<String, ProjectionError> {
    let bytes = require_payload(op)?;
    payload::decode::<Draft>(&op.namespace, Some(bytes))?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
