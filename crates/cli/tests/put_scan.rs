// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for writing to and scanning the operation log

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::{Env, ALICE};
use predicates::prelude::*;

const NS: &str = "app.bsky.some.col";

#[test]
fn help_describes_stash() {
    Command::cargo_bin("stash")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replicates private user data"));
}

#[test]
fn put_create_prints_stored_operation() {
    let env = Env::new();
    env.stash()
        .args(["put", "create", "--actor", ALICE, "--namespace", NS, "--key", "k1"])
        .args(["--payload", r#"{"text":"hi"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE"))
        .stdout(predicate::str::contains("k1"));

    assert!(env.log_path().exists());
}

#[test]
fn put_create_without_key_generates_one() {
    let env = Env::new();
    let output = env
        .stash()
        .args(["--output", "json", "put", "create", "--actor", ALICE, "--namespace", NS])
        .args(["--payload", "{}"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stored: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stored["key"].as_str().unwrap().len(), 13);
    assert_eq!(stored["seq"], 1);
}

#[test]
fn put_rejects_invalid_payload_before_logging() {
    let env = Env::new();
    env.stash()
        .args(["put", "create", "--actor", ALICE])
        .args(["--namespace", "app.bsky.draft.defs#draft", "--key", "d1"])
        .args(["--payload", r#"{"posts":[]}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("draft must contain at least one post"));

    env.stash()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("No operations"));
}

#[test]
fn put_delete_rejects_payload() {
    let env = Env::new();
    env.stash()
        .args(["put", "delete", "--actor", ALICE, "--namespace", NS, "--key", "k1"])
        .args(["--payload", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("delete does not take a payload"));
}

#[test]
fn put_rejects_invalid_actor() {
    let env = Env::new();
    env.stash()
        .args(["put", "delete", "--actor", "alice", "--namespace", NS, "--key", "k1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid DID"));
}

#[test]
fn scan_lists_operations_per_stream() {
    let env = Env::new();
    env.put("create", NS, "k1", Some(r#"{"v":1}"#));
    env.put(
        "create",
        "app.bsky.graph.defs#mute",
        "did:example:bob",
        Some(r#"{"subject":"did:example:bob"}"#),
    );
    env.put("delete", NS, "k1", None);

    env.stash()
        .args(["scan", "--stream", "operation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE"))
        .stdout(predicate::str::contains("DELETE"))
        .stdout(predicate::str::contains("did:example:bob").not());

    env.stash()
        .args(["scan", "--stream", "mute"])
        .assert()
        .success()
        .stdout(predicate::str::contains("did:example:bob"));

    env.stash()
        .args(["scan", "--stream", "operation", "--cursor", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE").not())
        .stdout(predicate::str::contains("DELETE"));
}

#[test]
fn scan_rejects_unknown_stream() {
    let env = Env::new();
    env.stash()
        .args(["scan", "--stream", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown stream"));
}
