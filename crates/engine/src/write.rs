// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write path: validate, tag and submit operations to the log

use crate::error::WriteError;
use serde_json::Value;
use stash_adapters::LogService;
use stash_core::{payload, Method, NewOperation, Operation, SchemaRegistry};

/// Submits private-data mutations to the log service
///
/// Each call validates (for `create`/`update`), then issues exactly one
/// `put`. There is no batching, retry or dedupe; callers needing idempotence
/// consult the generic projection first (see [`crate::Stash`]).
#[derive(Clone)]
pub struct WriteClient<L> {
    log: L,
    schemas: SchemaRegistry,
}

impl<L: LogService> WriteClient<L> {
    pub fn new(log: L, schemas: SchemaRegistry) -> Self {
        Self { log, schemas }
    }

    pub async fn create(
        &self,
        actor: &str,
        namespace: &str,
        key: &str,
        payload: &Value,
    ) -> Result<Operation, WriteError> {
        self.submit(actor, namespace, key, Method::Create, Some(payload)).await
    }

    pub async fn update(
        &self,
        actor: &str,
        namespace: &str,
        key: &str,
        payload: &Value,
    ) -> Result<Operation, WriteError> {
        self.submit(actor, namespace, key, Method::Update, Some(payload)).await
    }

    pub async fn delete(
        &self,
        actor: &str,
        namespace: &str,
        key: &str,
    ) -> Result<Operation, WriteError> {
        self.submit(actor, namespace, key, Method::Delete, None).await
    }

    async fn submit(
        &self,
        actor: &str,
        namespace: &str,
        key: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Operation, WriteError> {
        let payload = match body {
            Some(body) => {
                self.schemas.validate(namespace, body)?;
                self.schemas.validate_key(namespace, key, body)?;
                Some(payload::encode(namespace, body)?)
            }
            None => None,
        };

        let op = NewOperation {
            actor: actor.to_string(),
            namespace: namespace.to_string(),
            key: key.to_string(),
            method,
            payload,
        };
        Ok(self.log.put(op).await?)
    }
}

#[cfg(test)]
#[path = "write_tests.rs"]
mod tests;
