// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stash-core: shared vocabulary of the private-data log
//!
//! This crate provides:
//! - Operations, methods and streams as stored in the log
//! - Known namespaces and their typed payload records
//! - Schema validation and namespace-tagged payload encoding
//! - Clock and key generation abstractions

pub mod clock;
pub mod id;
pub mod namespace;
pub mod operation;
pub mod payload;
pub mod records;
pub mod schema;
pub mod uri;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{KeyGen, SequentialKeyGen, TidGen};
pub use operation::{Method, NewOperation, Operation, Seq, Stream};
pub use payload::PayloadError;
pub use schema::{Schema, SchemaRegistry, ValidationError};
