// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-subject activity subscriptions

use super::{require_payload, ProjectionHandler};
use crate::error::ProjectionError;
use chrono::{DateTime, Utc};
use stash_core::records::SubjectActivitySubscription;
use stash_core::{payload, Method, Operation};
use stash_storage::tables::ActivitySubscriptionRow;
use stash_storage::Database;

pub struct ActivitySubscriptionHandler;

impl ProjectionHandler for ActivitySubscriptionHandler {
    fn apply(
        &self,
        db: &Database,
        op: &Operation,
        now: DateTime<Utc>,
    ) -> Result<(), ProjectionError> {
        match op.method {
            Method::Create | Method::Update => {
                let sub: SubjectActivitySubscription =
                    payload::decode(&op.namespace, Some(require_payload(op)?))?;
                db.write().upsert_activity_subscription(ActivitySubscriptionRow {
                    creator: op.actor.clone(),
                    key: op.key.clone(),
                    subject_did: sub.subject,
                    post: sub.activity_subscription.post,
                    reply: sub.activity_subscription.reply,
                    indexed_at: now,
                });
            }
            Method::Delete => {
                db.write().delete_activity_subscription(&op.actor, &op.key);
            }
        }
        Ok(())
    }
}
