// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Age-assurance state on the actor row

use super::{require_payload, ProjectionHandler};
use crate::error::ProjectionError;
use chrono::{DateTime, Utc};
use stash_core::records::{AgeAssuranceEvent, AgeAssuranceStatus};
use stash_core::{payload, Method, Operation};
use stash_storage::Database;

/// Events are append-only: only CREATE is projected, and only onto actors
/// the replica already knows.
pub struct AgeAssuranceHandler;

impl ProjectionHandler for AgeAssuranceHandler {
    fn apply(
        &self,
        db: &Database,
        op: &Operation,
        _now: DateTime<Utc>,
    ) -> Result<(), ProjectionError> {
        if op.method != Method::Create {
            return Ok(());
        }

        let event: AgeAssuranceEvent =
            payload::decode(&op.namespace, Some(require_payload(op)?))?;
        let mut tables = db.write();
        let Some(actor) = tables.actor_mut(&op.actor) else {
            tracing::debug!(actor = %op.actor, "age assurance event for unknown actor");
            return Ok(());
        };

        actor.age_assurance_status = Some(event.status.as_str().to_string());
        if event.status == AgeAssuranceStatus::Pending {
            actor.age_assurance_last_initiated_at = Some(event.created_at);
        }
        if event.access.is_some() {
            actor.age_assurance_access = event.access;
        }
        if event.country_code.is_some() {
            actor.age_assurance_country_code = event.country_code;
        }
        if event.region_code.is_some() {
            actor.age_assurance_region_code = event.region_code;
        }
        Ok(())
    }
}
