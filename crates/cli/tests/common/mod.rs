// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

pub const ALICE: &str = "did:example:alice";
pub const POST: &str = "at://did:example:bob/app.bsky.feed.post/p1";

/// Isolated working directory with its own log and snapshot
pub struct Env {
    pub dir: TempDir,
}

impl Env {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("oplog.jsonl")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.path().join("snapshot.json")
    }

    /// `stash` invocation pointed at this environment
    pub fn stash(&self) -> Command {
        let mut cmd = Command::cargo_bin("stash").expect("stash binary");
        cmd.current_dir(self.dir.path())
            .env("RUST_LOG", "warn")
            .arg("--config")
            .arg(self.dir.path().join("stash.toml"))
            .arg("--log")
            .arg(self.log_path())
            .arg("--snapshot")
            .arg(self.snapshot_path());
        cmd
    }

    /// Submit an operation and expect success
    pub fn put(&self, method: &str, namespace: &str, key: &str, payload: Option<&str>) {
        let mut cmd = self.stash();
        cmd.args(["put", method, "--actor", ALICE, "--namespace", namespace, "--key", key]);
        if let Some(payload) = payload {
            cmd.args(["--payload", payload]);
        }
        cmd.assert().success();
    }
}
