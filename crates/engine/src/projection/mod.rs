// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projection of replicated operations into the local store
//!
//! ```text
//! Operation → generic (private_data) → handler[namespace]? → feature tables
//! ```
//!
//! The generic projection always runs first and is never rolled back by a
//! failing handler. Handlers must be safe to re-run: the log is delivered
//! at least once.

mod age_assurance;
mod bookmark;
mod draft;
mod generic;
mod mute;
mod notif;
mod subscription;

pub use age_assurance::AgeAssuranceHandler;
pub use bookmark::BookmarkHandler;
pub use draft::DraftHandler;
pub use mute::{mute_kind, MuteClearHandler, MuteHandler};
pub use notif::NotifPriorityHandler;
pub use subscription::ActivitySubscriptionHandler;

use crate::error::ProjectionError;
use chrono::{DateTime, Utc};
use stash_core::{namespace, Clock, Operation};
use stash_storage::Database;
use std::collections::HashMap;
use std::sync::Arc;

/// Namespace-specific projection into feature tables
pub trait ProjectionHandler: Send + Sync {
    fn apply(&self, db: &Database, op: &Operation, now: DateTime<Utc>)
        -> Result<(), ProjectionError>;
}

/// Applies operations to the store
#[derive(Clone)]
pub struct ProjectionEngine<C> {
    db: Database,
    clock: C,
    handlers: HashMap<String, Arc<dyn ProjectionHandler>>,
}

impl<C: Clock> ProjectionEngine<C> {
    /// Engine with only the generic projection
    pub fn new(db: Database, clock: C) -> Self {
        Self {
            db,
            clock,
            handlers: HashMap::new(),
        }
    }

    /// Engine with handlers for every known namespace
    pub fn builtin(db: Database, clock: C) -> Self {
        Self::new(db, clock)
            .register(namespace::BOOKMARK, BookmarkHandler)
            .register(namespace::DRAFT, DraftHandler)
            .register(
                namespace::SUBJECT_ACTIVITY_SUBSCRIPTION,
                ActivitySubscriptionHandler,
            )
            .register(namespace::AGE_ASSURANCE_EVENT, AgeAssuranceHandler)
            .register(namespace::MUTE, MuteHandler)
            .register(namespace::MUTE_CLEAR, MuteClearHandler)
            .register(namespace::NOTIF_PRIORITY, NotifPriorityHandler)
    }

    pub fn register(
        mut self,
        ns: impl Into<String>,
        handler: impl ProjectionHandler + 'static,
    ) -> Self {
        self.handlers.insert(ns.into(), Arc::new(handler));
        self
    }

    pub fn has_handler(&self, ns: &str) -> bool {
        self.handlers.contains_key(ns)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Apply one operation: generic projection, then the namespace handler
    ///
    /// A handler error is returned after the generic projection has been
    /// committed.
    pub fn apply(&self, op: &Operation) -> Result<(), ProjectionError> {
        let now = self.clock.now();
        generic::apply(&self.db, op, now)?;

        let Some(handler) = self.handlers.get(&op.namespace) else {
            return Ok(());
        };
        handler
            .apply(&self.db, op, now)
            .map_err(|source| ProjectionError::Handler {
                namespace: op.namespace.clone(),
                source: Box::new(source),
            })
    }
}

/// Payload of a CREATE/UPDATE operation
pub(crate) fn require_payload(op: &Operation) -> Result<&[u8], ProjectionError> {
    op.payload
        .as_deref()
        .ok_or_else(|| ProjectionError::MissingPayload {
            namespace: op.namespace.clone(),
            method: op.method.to_string(),
        })
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
