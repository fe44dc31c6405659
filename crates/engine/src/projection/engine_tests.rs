// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use serde_json::{json, Value};
use stash_core::{FakeClock, Method};

const ACTOR: &str = "did:example:alice";
const NS: &str = "app.bsky.some.col";

fn engine() -> (FakeClock, ProjectionEngine<FakeClock>) {
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    let engine = ProjectionEngine::builtin(Database::new(), clock.clone());
    (clock, engine)
}

fn op(seq: u64, ns: &str, key: &str, method: Method, body: Option<Value>) -> Operation {
    Operation {
        seq,
        actor: ACTOR.to_string(),
        namespace: ns.to_string(),
        key: key.to_string(),
        method,
        payload: body.map(|b| stash_core::payload::encode(ns, &b).unwrap()),
    }
}

struct FailingHandler;

impl ProjectionHandler for FailingHandler {
    fn apply(
        &self,
        _db: &Database,
        op: &Operation,
        _now: DateTime<Utc>,
    ) -> Result<(), ProjectionError> {
        Err(ProjectionError::UnsupportedCollection(op.key.clone()))
    }
}

#[test]
fn create_projects_tagged_payload() {
    let (_, engine) = engine();
    engine
        .apply(&op(1, NS, "k1", Method::Create, Some(json!({"a": 1}))))
        .unwrap();

    let db = engine.db().read();
    let row = db.private_data(ACTOR, NS, "k1").unwrap();
    let stored: Value = serde_json::from_str(&row.payload).unwrap();
    assert_eq!(stored, json!({"$type": NS, "a": 1}));
}

#[test]
fn update_overwrites_payload_and_timestamp() {
    let (clock, engine) = engine();
    engine
        .apply(&op(1, NS, "k1", Method::Create, Some(json!({"v": 1}))))
        .unwrap();
    let created = clock.now();
    clock.advance(chrono::Duration::seconds(30));
    engine
        .apply(&op(2, NS, "k1", Method::Update, Some(json!({"v": 2}))))
        .unwrap();

    let db = engine.db().read();
    let row = db.private_data(ACTOR, NS, "k1").unwrap();
    assert!(row.payload.contains(r#""v":2"#));
    assert_eq!(row.indexed_at, created);
    assert_eq!(row.updated_at, clock.now());
}

#[test]
fn duplicate_create_converges() {
    let (_, engine) = engine();
    let create = op(1, NS, "k1", Method::Create, Some(json!({"v": 1})));
    engine.apply(&create).unwrap();
    let once = engine.db().snapshot();
    engine.apply(&create).unwrap();

    assert_eq!(engine.db().snapshot(), once);
}

#[test]
fn delete_is_idempotent() {
    let (_, engine) = engine();
    engine
        .apply(&op(1, NS, "k1", Method::Create, Some(json!({}))))
        .unwrap();
    engine.apply(&op(2, NS, "k1", Method::Delete, None)).unwrap();
    engine.apply(&op(3, NS, "k1", Method::Delete, None)).unwrap();

    assert!(engine.db().read().private_data(ACTOR, NS, "k1").is_none());
}

#[test]
fn create_without_payload_fails() {
    let (_, engine) = engine();
    let err = engine
        .apply(&op(1, NS, "k1", Method::Create, None))
        .unwrap_err();
    assert!(matches!(err, ProjectionError::MissingPayload { .. }));
}

#[test]
fn handler_failure_keeps_generic_row() {
    let engine = ProjectionEngine::new(Database::new(), FakeClock::new())
        .register("app.bsky.flaky.col", FailingHandler);
    let err = engine
        .apply(&op(
            1,
            "app.bsky.flaky.col",
            "k1",
            Method::Create,
            Some(json!({})),
        ))
        .unwrap_err();

    assert!(matches!(
        err,
        ProjectionError::Handler { ref namespace, .. } if namespace == "app.bsky.flaky.col"
    ));
    assert!(engine
        .db()
        .read()
        .private_data(ACTOR, "app.bsky.flaky.col", "k1")
        .is_some());
}

#[test]
fn unregistered_namespace_only_uses_generic() {
    let (_, engine) = engine();
    assert!(!engine.has_handler(NS));
    assert!(engine.has_handler(stash_core::namespace::BOOKMARK));

    engine
        .apply(&op(1, NS, "k1", Method::Create, Some(json!({}))))
        .unwrap();
    let db = engine.db().read();
    assert_eq!(db.private_data.len(), 1);
    assert!(db.bookmarks.is_empty());
    assert!(db.drafts.is_empty());
}
