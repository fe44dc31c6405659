// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespace-tagged payload encoding
//!
//! Payloads travel through the log as JSON objects carrying a `$type` field
//! naming their namespace, so a projection can recover the type without any
//! out-of-band metadata.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Field holding the namespace tag
pub const TYPE_FIELD: &str = "$type";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload must be a JSON object")]
    NotAnObject,
    #[error("payload is missing")]
    Missing,
    #[error("payload tagged {found}, expected {expected}")]
    TypeMismatch { expected: String, found: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tag a payload with its namespace and serialize it
pub fn encode(namespace: &str, payload: &Value) -> Result<Vec<u8>, PayloadError> {
    let Value::Object(fields) = payload else {
        return Err(PayloadError::NotAnObject);
    };

    let mut tagged = Map::with_capacity(fields.len() + 1);
    tagged.insert(TYPE_FIELD.to_string(), Value::String(namespace.to_string()));
    for (name, value) in fields {
        if name != TYPE_FIELD {
            tagged.insert(name.clone(), value.clone());
        }
    }

    Ok(serde_json::to_vec(&Value::Object(tagged))?)
}

/// Parse a tagged payload, returning its namespace tag and the untagged body
pub fn decode_value(bytes: &[u8]) -> Result<(Option<String>, Value), PayloadError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(mut fields) = value else {
        return Err(PayloadError::NotAnObject);
    };

    let tag = match fields.remove(TYPE_FIELD) {
        Some(Value::String(tag)) => Some(tag),
        _ => None,
    };
    Ok((tag, Value::Object(fields)))
}

/// Decode a tagged payload into a typed record of the expected namespace
pub fn decode<T: DeserializeOwned>(namespace: &str, bytes: Option<&[u8]>) -> Result<T, PayloadError> {
    let bytes = bytes.ok_or(PayloadError::Missing)?;
    let (tag, body) = decode_value(bytes)?;

    if let Some(found) = tag {
        if found != namespace {
            return Err(PayloadError::TypeMismatch {
                expected: namespace.to_string(),
                found,
            });
        }
    }

    Ok(serde_json::from_value(body)?)
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
