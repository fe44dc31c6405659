// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic projection: one `private_data` row per (actor, namespace, key)

use super::require_payload;
use crate::error::ProjectionError;
use chrono::{DateTime, Utc};
use stash_core::{Method, Operation};
use stash_storage::tables::PrivateDataRow;
use stash_storage::Database;

pub(crate) fn apply(
    db: &Database,
    op: &Operation,
    now: DateTime<Utc>,
) -> Result<(), ProjectionError> {
    match op.method {
        Method::Create | Method::Update => {
            let payload = String::from_utf8_lossy(require_payload(op)?).into_owned();
            db.write().upsert_private_data(PrivateDataRow {
                actor: op.actor.clone(),
                namespace: op.namespace.clone(),
                key: op.key.clone(),
                payload,
                indexed_at: now,
                updated_at: now,
            });
        }
        Method::Delete => {
            db.write()
                .delete_private_data(&op.actor, &op.namespace, &op.key);
        }
    }
    Ok(())
}
