// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::projection::ProjectionEngine;
use serde_json::json;
use stash_adapters::{FakeLogService, LogService};
use stash_core::{FakeClock, SchemaRegistry, SequentialKeyGen, Stream};

const ALICE: &str = "did:example:alice";
const POST: &str = "at://did:example:bob/app.bsky.feed.post/p1";

struct Harness {
    log: FakeLogService,
    engine: ProjectionEngine<FakeClock>,
    stash: Stash<FakeLogService, SequentialKeyGen>,
}

impl Harness {
    fn new() -> Self {
        let log = FakeLogService::new();
        let db = Database::new();
        let engine = ProjectionEngine::builtin(db.clone(), FakeClock::new());
        let writer = WriteClient::new(log.clone(), SchemaRegistry::builtin());
        let stash = Stash::new(writer, db, SequentialKeyGen::new("draft")).with_draft_limit(2);
        Self { log, engine, stash }
    }

    /// Apply everything written so far, the way a replica would
    async fn replicate(&self) {
        let page = self.log.scan(Stream::Operation, None, 1000).await.unwrap();
        for op in &page.operations {
            self.engine.apply(op).unwrap();
        }
    }
}

fn bookmark() -> serde_json::Value {
    json!({"subject": {"uri": POST, "cid": "bafyreib"}})
}

#[tokio::test]
async fn put_if_absent_skips_existing_record() {
    let h = Harness::new();
    let first = h
        .stash
        .put_if_absent(ALICE, namespace::BOOKMARK, "k1", &bookmark())
        .await
        .unwrap();
    assert!(first.is_some());
    h.replicate().await;

    let second = h
        .stash
        .put_if_absent(ALICE, namespace::BOOKMARK, "k1", &bookmark())
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(h.log.puts().len(), 1);
}

#[tokio::test]
async fn delete_if_present_skips_missing_record() {
    let h = Harness::new();
    let skipped = h
        .stash
        .delete_if_present(ALICE, namespace::BOOKMARK, "k1")
        .await
        .unwrap();
    assert!(skipped.is_none());
    assert!(h.log.calls().is_empty());

    h.stash
        .put_if_absent(ALICE, namespace::BOOKMARK, "k1", &bookmark())
        .await
        .unwrap();
    h.replicate().await;
    let deleted = h
        .stash
        .delete_if_present(ALICE, namespace::BOOKMARK, "k1")
        .await
        .unwrap();
    assert!(deleted.is_some());
}

#[tokio::test]
async fn create_draft_enforces_limit() {
    let h = Harness::new();
    let draft = json!({"posts": [{"text": "hello"}]});

    let k1 = h.stash.create_draft(ALICE, &draft).await.unwrap();
    let k2 = h.stash.create_draft(ALICE, &draft).await.unwrap();
    assert_ne!(k1, k2);
    h.replicate().await;

    let err = h.stash.create_draft(ALICE, &draft).await.unwrap_err();
    assert!(matches!(err, StashError::DraftLimitReached { limit: 2 }));
    assert_eq!(h.log.puts().len(), 2);

    // Updates are not subject to the quota
    h.stash
        .update_draft(ALICE, &k1, &json!({"posts": [{"text": "edited"}]}))
        .await
        .unwrap();

    h.stash.delete_draft(ALICE, &k2).await.unwrap();
    h.replicate().await;
    h.stash.create_draft(ALICE, &draft).await.unwrap();
}

#[tokio::test]
async fn invalid_draft_is_rejected_before_log() {
    let h = Harness::new();
    let err = h
        .stash
        .create_draft(ALICE, &json!({"posts": []}))
        .await
        .unwrap_err();

    assert!(matches!(err, StashError::Write(_)));
    assert!(h.log.calls().is_empty());
}
