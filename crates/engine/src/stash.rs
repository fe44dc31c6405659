// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feature-level writes built on the write client
//!
//! The write client never deduplicates. These helpers read the local store
//! first so that user-facing create/delete calls are idempotent.

use crate::error::StashError;
use crate::write::WriteClient;
use serde_json::Value;
use stash_adapters::LogService;
use stash_core::{namespace, KeyGen, Operation};
use stash_storage::Database;

/// Default per-actor draft quota
pub const DEFAULT_DRAFT_LIMIT: usize = 500;

#[derive(Clone)]
pub struct Stash<L, K> {
    writer: WriteClient<L>,
    db: Database,
    keys: K,
    draft_limit: usize,
}

impl<L: LogService, K: KeyGen> Stash<L, K> {
    pub fn new(writer: WriteClient<L>, db: Database, keys: K) -> Self {
        Self {
            writer,
            db,
            keys,
            draft_limit: DEFAULT_DRAFT_LIMIT,
        }
    }

    pub fn with_draft_limit(mut self, limit: usize) -> Self {
        self.draft_limit = limit;
        self
    }

    /// Create a record unless the generic projection already has it
    pub async fn put_if_absent(
        &self,
        actor: &str,
        ns: &str,
        key: &str,
        payload: &Value,
    ) -> Result<Option<Operation>, StashError> {
        if self.exists(actor, ns, key) {
            tracing::debug!(actor, namespace = ns, key, "record exists, skipping create");
            return Ok(None);
        }
        Ok(Some(self.writer.create(actor, ns, key, payload).await?))
    }

    /// Delete a record only if the generic projection has it
    pub async fn delete_if_present(
        &self,
        actor: &str,
        ns: &str,
        key: &str,
    ) -> Result<Option<Operation>, StashError> {
        if !self.exists(actor, ns, key) {
            tracing::debug!(actor, namespace = ns, key, "record absent, skipping delete");
            return Ok(None);
        }
        Ok(Some(self.writer.delete(actor, ns, key).await?))
    }

    /// Create a draft under a fresh key, enforcing the per-actor quota
    pub async fn create_draft(&self, actor: &str, draft: &Value) -> Result<String, StashError> {
        let count = self.db.read().count_drafts(actor);
        if count >= self.draft_limit {
            return Err(StashError::DraftLimitReached {
                limit: self.draft_limit,
            });
        }

        let key = self.keys.next();
        self.writer
            .create(actor, namespace::DRAFT, &key, draft)
            .await?;
        Ok(key)
    }

    /// Replace a draft. Replicas ignore updates to drafts they never saw.
    pub async fn update_draft(
        &self,
        actor: &str,
        key: &str,
        draft: &Value,
    ) -> Result<Operation, StashError> {
        Ok(self
            .writer
            .update(actor, namespace::DRAFT, key, draft)
            .await?)
    }

    pub async fn delete_draft(&self, actor: &str, key: &str) -> Result<Operation, StashError> {
        Ok(self.writer.delete(actor, namespace::DRAFT, key).await?)
    }

    fn exists(&self, actor: &str, ns: &str, key: &str) -> bool {
        self.db.read().private_data(actor, ns, key).is_some()
    }
}

#[cfg(test)]
#[path = "stash_tests.rs"]
mod tests;
