// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stash-engine: writing to and replicating from the private-data log
//!
//! ```text
//! WriteClient ──put──▶ LogService ◀──scan── ReplicationConsumer
//!                                                  │ Batch
//!                                                  ▼
//!                     ProjectionEngine ◀── BackgroundApplier
//! ```

mod applier;
mod consumer;
mod error;
pub mod projection;
mod stash;
mod supervisor;
mod write;

pub use applier::{BackgroundApplier, Batch};
pub use consumer::{ConsumerConfig, ReplicationConsumer, StreamStatus};
pub use error::{ConsumerError, ProjectionError, StashError, WriteError};
pub use projection::{ProjectionEngine, ProjectionHandler};
pub use stash::{Stash, DEFAULT_DRAFT_LIMIT};
pub use supervisor::Supervisor;
pub use write::WriteClient;
