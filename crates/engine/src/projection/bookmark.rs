// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bookmarks and the per-post bookmark count

use super::{require_payload, ProjectionHandler};
use crate::error::ProjectionError;
use chrono::{DateTime, Utc};
use stash_core::namespace;
use stash_core::records::Bookmark;
use stash_core::uri::AtUri;
use stash_core::{payload, Method, Operation};
use stash_storage::tables::BookmarkRow;
use stash_storage::Database;

/// Bookmarks are immutable: CREATE inserts, DELETE removes, UPDATE is ignored.
/// Each write recomputes the subject's count from bookmark rows in the same
/// transaction.
pub struct BookmarkHandler;

impl ProjectionHandler for BookmarkHandler {
    fn apply(
        &self,
        db: &Database,
        op: &Operation,
        now: DateTime<Utc>,
    ) -> Result<(), ProjectionError> {
        match op.method {
            Method::Create => {
                let bookmark: Bookmark =
                    payload::decode(&op.namespace, Some(require_payload(op)?))?;
                let subject = AtUri::parse(&bookmark.subject.uri)?;
                if subject.collection() != Some(namespace::POST_COLLECTION) {
                    return Err(ProjectionError::UnsupportedCollection(
                        subject.collection().unwrap_or_default().to_string(),
                    ));
                }

                db.transaction(|tables| {
                    tables.upsert_bookmark(BookmarkRow {
                        creator: op.actor.clone(),
                        key: op.key.clone(),
                        subject_uri: bookmark.subject.uri.clone(),
                        subject_cid: bookmark.subject.cid.clone(),
                        indexed_at: now,
                    });
                    let count = tables.count_bookmarks(&bookmark.subject.uri);
                    tables.set_bookmark_count(&bookmark.subject.uri, count);
                    Ok(())
                })
            }
            Method::Update => {
                tracing::debug!(actor = %op.actor, key = %op.key, "ignoring bookmark update");
                Ok(())
            }
            Method::Delete => db.transaction(|tables| {
                let Some(removed) = tables.delete_bookmark(&op.actor, &op.key) else {
                    return Ok(());
                };
                let count = tables.count_bookmarks(&removed.subject_uri);
                tables.set_bookmark_count(&removed.subject_uri, count);
                Ok(())
            }),
        }
    }
}
