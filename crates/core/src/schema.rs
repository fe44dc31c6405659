// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload schemas and the namespace registry

use crate::records::{
    AgeAssuranceEvent, Bookmark, Draft, Mute, MuteClear, NotifPriority,
    SubjectActivitySubscription,
};
use crate::uri::{is_did, AtUri};
use crate::{namespace, payload};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {namespace} payload: {message}")]
    Invalid { namespace: String, message: String },
    #[error("no schema registered for namespace {0}")]
    UnknownNamespace(String),
}

/// Validates payloads of one namespace
pub trait Schema: Send + Sync {
    /// Check the untagged payload. Returns a human-readable reason on failure.
    fn check(&self, payload: &Value) -> Result<(), String>;
}

/// Semantic checks run after a payload deserialized into its record type
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Schema backed by a serde record type
pub struct RecordSchema<T> {
    _record: PhantomData<fn() -> T>,
}

impl<T> RecordSchema<T> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<T> Default for RecordSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned + Validate> Schema for RecordSchema<T> {
    fn check(&self, payload: &Value) -> Result<(), String> {
        let record: T = serde_json::from_value(payload.clone()).map_err(|e| e.to_string())?;
        record.validate()
    }
}

/// Accepts any JSON object
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSchema;

impl Schema for ObjectSchema {
    fn check(&self, payload: &Value) -> Result<(), String> {
        if payload.is_object() {
            Ok(())
        } else {
            Err("payload must be a JSON object".to_string())
        }
    }
}

/// Maps namespaces to their schemas
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<dyn Schema>>,
    fallback: Option<Arc<dyn Schema>>,
}

impl SchemaRegistry {
    /// An empty registry that rejects every namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with schemas for every known namespace. Unknown namespaces
    /// only need to be JSON objects.
    pub fn builtin() -> Self {
        Self::new()
            .register(namespace::BOOKMARK, RecordSchema::<Bookmark>::new())
            .register(namespace::DRAFT, RecordSchema::<Draft>::new())
            .register(
                namespace::SUBJECT_ACTIVITY_SUBSCRIPTION,
                RecordSchema::<SubjectActivitySubscription>::new(),
            )
            .register(
                namespace::AGE_ASSURANCE_EVENT,
                RecordSchema::<AgeAssuranceEvent>::new(),
            )
            .register(namespace::MUTE, RecordSchema::<Mute>::new())
            .register(namespace::MUTE_CLEAR, RecordSchema::<MuteClear>::new())
            .register(namespace::NOTIF_PRIORITY, RecordSchema::<NotifPriority>::new())
            .with_fallback(ObjectSchema)
    }

    pub fn register(mut self, ns: impl Into<String>, schema: impl Schema + 'static) -> Self {
        self.schemas.insert(ns.into(), Arc::new(schema));
        self
    }

    pub fn with_fallback(mut self, schema: impl Schema + 'static) -> Self {
        self.fallback = Some(Arc::new(schema));
        self
    }

    /// Validate a payload against the schema registered for `ns`
    pub fn validate(&self, ns: &str, payload: &Value) -> Result<(), ValidationError> {
        let schema = self
            .schemas
            .get(ns)
            .or(self.fallback.as_ref())
            .ok_or_else(|| ValidationError::UnknownNamespace(ns.to_string()))?;

        // A caller-supplied tag is replaced on encode; validate the body only
        let body = match payload {
            Value::Object(fields) if fields.contains_key(payload::TYPE_FIELD) => {
                let mut fields = fields.clone();
                fields.remove(payload::TYPE_FIELD);
                Value::Object(fields)
            }
            other => other.clone(),
        };

        schema.check(&body).map_err(|message| ValidationError::Invalid {
            namespace: ns.to_string(),
            message,
        })
    }

    /// Check the record key against its payload. Mutes are keyed by their
    /// subject so that DELETE can find the mute it removes.
    pub fn validate_key(
        &self,
        ns: &str,
        key: &str,
        payload: &Value,
    ) -> Result<(), ValidationError> {
        match mute_subject(ns, payload) {
            Some(subject) if subject != key => Err(ValidationError::Invalid {
                namespace: ns.to_string(),
                message: format!("mute key {key} must equal its subject {subject}"),
            }),
            _ => Ok(()),
        }
    }

    pub fn is_registered(&self, ns: &str) -> bool {
        self.schemas.contains_key(ns)
    }
}

/// Subject of a mute payload, if `ns` is the mute namespace
pub fn mute_subject<'a>(ns: &str, payload: &'a Value) -> Option<&'a str> {
    if ns != namespace::MUTE {
        return None;
    }
    payload.get("subject").and_then(Value::as_str)
}

impl Validate for Bookmark {
    fn validate(&self) -> Result<(), String> {
        let uri = AtUri::parse(&self.subject.uri).map_err(|e| e.to_string())?;
        match uri.collection() {
            Some(namespace::POST_COLLECTION) if uri.rkey.is_some() => {}
            Some(collection) if collection != namespace::POST_COLLECTION => {
                return Err(format!("unsupported collection: {collection}"))
            }
            _ => return Err(format!("subject is not a record uri: {}", self.subject.uri)),
        }
        if self.subject.cid.is_empty() {
            return Err("subject cid is required".to_string());
        }
        Ok(())
    }
}

impl Validate for Draft {
    fn validate(&self) -> Result<(), String> {
        if self.posts.is_empty() {
            return Err("draft must contain at least one post".to_string());
        }
        Ok(())
    }
}

impl Validate for SubjectActivitySubscription {
    fn validate(&self) -> Result<(), String> {
        if !is_did(&self.subject) {
            return Err(format!("subject is not a DID: {}", self.subject));
        }
        Ok(())
    }
}

impl Validate for AgeAssuranceEvent {
    fn validate(&self) -> Result<(), String> {
        chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| format!("createdAt is not a datetime: {e}"))?;
        if self.attempt_id.is_empty() {
            return Err("attemptId is required".to_string());
        }
        Ok(())
    }
}

impl Validate for Mute {
    fn validate(&self) -> Result<(), String> {
        if is_did(&self.subject) || AtUri::parse(&self.subject).is_ok() {
            Ok(())
        } else {
            Err(format!("mute subject must be a DID or at:// uri: {}", self.subject))
        }
    }
}

impl Validate for MuteClear {}

impl Validate for NotifPriority {}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
