// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification priority preference

use super::{require_payload, ProjectionHandler};
use crate::error::ProjectionError;
use chrono::{DateTime, Utc};
use stash_core::records::NotifPriority;
use stash_core::{payload, Method, Operation};
use stash_storage::Database;

pub struct NotifPriorityHandler;

impl ProjectionHandler for NotifPriorityHandler {
    fn apply(
        &self,
        db: &Database,
        op: &Operation,
        now: DateTime<Utc>,
    ) -> Result<(), ProjectionError> {
        let priority = match op.method {
            Method::Create | Method::Update => {
                let pref: NotifPriority =
                    payload::decode(&op.namespace, Some(require_payload(op)?))?;
                pref.priority
            }
            Method::Delete => false,
        };
        db.write().upsert_priority_notifs(&op.actor, priority, now);
        Ok(())
    }
}
