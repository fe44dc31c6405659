// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stash-storage: the durable operation log and the replica's local store

mod db;
mod oplog;
mod snapshot;
pub mod tables;

pub use db::{Database, Transaction};
pub use oplog::{OpLog, OpLogEntry, OpLogError, DEFAULT_SCAN_LIMIT, MAX_SCAN_LIMIT};
pub use snapshot::{Snapshot, SnapshotError, SNAPSHOT_VERSION};
pub use tables::{MuteKind, Tables};
