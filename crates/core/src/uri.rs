// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal identifier parsing: DIDs and `at://` record URIs

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("not an at:// uri: {0}")]
    Scheme(String),
    #[error("uri has no authority: {0}")]
    MissingAuthority(String),
}

/// Check that a string is syntactically a DID (`did:<method>:<identifier>`)
pub fn is_did(s: &str) -> bool {
    let mut parts = s.splitn(3, ':');
    let (Some("did"), Some(method), Some(ident)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    !method.is_empty()
        && method.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && !ident.is_empty()
        && !ident.ends_with(':')
        && ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '%' | '-'))
}

/// An `at://authority/collection/rkey` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtUri {
    pub authority: String,
    pub collection: Option<String>,
    pub rkey: Option<String>,
}

impl AtUri {
    pub fn parse(s: &str) -> Result<Self, UriError> {
        let rest = s
            .strip_prefix("at://")
            .ok_or_else(|| UriError::Scheme(s.to_string()))?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let mut parts = rest.split('/').filter(|p| !p.is_empty());

        let authority = parts
            .next()
            .ok_or_else(|| UriError::MissingAuthority(s.to_string()))?
            .to_string();

        Ok(Self {
            authority,
            collection: parts.next().map(str::to_string),
            rkey: parts.next().map(str::to_string),
        })
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}", self.authority)?;
        if let Some(collection) = &self.collection {
            write!(f, "/{collection}")?;
            if let Some(rkey) = &self.rkey {
                write!(f, "/{rkey}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "uri_tests.rs"]
mod tests;
