// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations carried by the private-data log

use crate::namespace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Log position assigned by the log service. Totally ordered, never reused.
pub type Seq = u64;

/// Mutation kind of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Create,
    Update,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Create => "CREATE",
            Method::Update => "UPDATE",
            Method::Delete => "DELETE",
        }
    }

    /// Whether operations with this method carry a payload
    pub fn has_payload(&self) -> bool {
        !matches!(self, Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Method::Create),
            "UPDATE" => Ok(Method::Update),
            "DELETE" => Ok(Method::Delete),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// Named partition of the log, polled independently by each replica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// Mute changes
    Mute,
    /// Notification-priority changes
    Notif,
    /// Everything else
    Operation,
}

impl Stream {
    pub const ALL: [Stream; 3] = [Stream::Mute, Stream::Notif, Stream::Operation];

    /// Stream that carries operations of the given namespace
    pub fn for_namespace(ns: &str) -> Stream {
        match ns {
            namespace::MUTE | namespace::MUTE_CLEAR => Stream::Mute,
            namespace::NOTIF_PRIORITY => Stream::Notif,
            _ => Stream::Operation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Mute => "mute",
            Stream::Notif => "notif",
            Stream::Operation => "operation",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown stream: {0}")]
pub struct UnknownStream(pub String);

impl FromStr for Stream {
    type Err = UnknownStream;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mute" => Ok(Stream::Mute),
            "notif" => Ok(Stream::Notif),
            "operation" => Ok(Stream::Operation),
            _ => Err(UnknownStream(s.to_string())),
        }
    }
}

/// An operation before the log has assigned it a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperation {
    pub actor: String,
    pub namespace: String,
    pub key: String,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl NewOperation {
    pub fn stream(&self) -> Stream {
        Stream::for_namespace(&self.namespace)
    }

    /// Attach the log position, producing the stored operation
    pub fn with_seq(self, seq: Seq) -> Operation {
        Operation {
            seq,
            actor: self.actor,
            namespace: self.namespace,
            key: self.key,
            method: self.method,
            payload: self.payload,
        }
    }
}

/// A stored operation, as returned by `put` and `scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub seq: Seq,
    pub actor: String,
    pub namespace: String,
    pub key: String,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl Operation {
    pub fn stream(&self) -> Stream {
        Stream::for_namespace(&self.namespace)
    }

    /// Payload as UTF-8 text, if present and valid
    pub fn payload_str(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
