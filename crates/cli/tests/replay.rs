// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for replaying the log into the projected store

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{Env, ALICE, POST};
use predicates::prelude::*;

const BOOKMARK: &str = "app.bsky.bookmark.defs#bookmark";

fn bookmark_payload() -> String {
    format!(r#"{{"subject":{{"uri":"{POST}","cid":"bafyreib"}}}}"#)
}

fn replay_json(env: &Env) -> serde_json::Value {
    let output = env.stash().args(["--output", "json", "replay"]).output().unwrap();
    assert!(
        output.status.success(),
        "replay failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn replay_of_empty_log_saves_empty_snapshot() {
    let env = Env::new();
    env.stash()
        .arg("replay")
        .assert()
        .success()
        .stdout(predicate::str::contains("private_data"))
        .stdout(predicate::str::contains("cursors: none"));

    assert!(env.snapshot_path().exists());
}

#[test]
fn replay_projects_bookmarks() {
    let env = Env::new();
    env.put("create", BOOKMARK, "b1", Some(&bookmark_payload()));

    let report = replay_json(&env);
    assert_eq!(report["bookmarks"].as_array().unwrap().len(), 1);
    assert_eq!(report["post_aggs"][0]["bookmark_count"], 1);
    assert_eq!(report["private_data"][0]["actor"], ALICE);
    assert_eq!(report["cursors"]["operation"], 1);
}

#[test]
fn replay_resumes_from_snapshot_cursor() {
    let env = Env::new();
    env.put("create", BOOKMARK, "b1", Some(&bookmark_payload()));
    replay_json(&env);

    env.put("delete", BOOKMARK, "b1", None);
    let report = replay_json(&env);

    assert!(report["bookmarks"].as_array().unwrap().is_empty());
    assert!(report["private_data"].as_array().unwrap().is_empty());
    assert_eq!(report["post_aggs"][0]["bookmark_count"], 0);
    assert_eq!(report["cursors"]["operation"], 2);
}

#[test]
fn replay_applies_mute_stream() {
    let env = Env::new();
    env.put(
        "create",
        "app.bsky.graph.defs#mute",
        "did:example:bob",
        Some(r#"{"subject":"did:example:bob"}"#),
    );

    env.stash()
        .arg("replay")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"mute\s+1").unwrap())
        .stdout(predicate::str::contains("mute=1"));
}
