// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the replication engine

use stash_adapters::LogError;
use stash_core::uri::UriError;
use stash_core::{PayloadError, Stream, ValidationError};
use thiserror::Error;

/// Errors from the write client
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),
    #[error("log error: {0}")]
    Log(#[from] LogError),
}

/// Errors from applying one operation to the store
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),
    #[error("invalid uri: {0}")]
    Uri(#[from] UriError),
    #[error("{method} operation on {namespace} requires a payload")]
    MissingPayload { namespace: String, method: String },
    #[error("unsupported collection: {0}")]
    UnsupportedCollection(String),
    #[error("key {key} does not match subject {subject}")]
    KeyMismatch { key: String, subject: String },
    #[error("{namespace} handler failed: {source}")]
    Handler {
        namespace: String,
        #[source]
        source: Box<ProjectionError>,
    },
}

/// Errors from the replication consumer
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("consumer is not following stream {0}")]
    NotFollowing(Stream),
    #[error("stream {0} halted")]
    Halted(Stream),
}

/// Errors from feature-level writes
#[derive(Debug, Error)]
pub enum StashError {
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("draft limit reached ({limit})")]
    DraftLimitReached { limit: usize },
}
