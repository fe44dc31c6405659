// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Known namespaces
//!
//! A namespace names both the record type and the schema its payload is
//! validated against. It is also the dispatch key for specialized projections.

pub const BOOKMARK: &str = "app.bsky.bookmark.defs#bookmark";
pub const DRAFT: &str = "app.bsky.draft.defs#draft";
pub const SUBJECT_ACTIVITY_SUBSCRIPTION: &str =
    "app.bsky.notification.defs#subjectActivitySubscription";
pub const AGE_ASSURANCE_EVENT: &str = "app.bsky.unspecced.defs#ageAssuranceEvent";
pub const MUTE: &str = "app.bsky.graph.defs#mute";
pub const MUTE_CLEAR: &str = "app.bsky.graph.defs#muteClear";
pub const NOTIF_PRIORITY: &str = "app.bsky.notification.defs#priority";

/// Key used by singleton records
pub const SELF_KEY: &str = "self";

/// Collection of records that may be bookmarked
pub const POST_COLLECTION: &str = "app.bsky.feed.post";
/// Collection whose URIs are muted as lists rather than threads
pub const LIST_COLLECTION: &str = "app.bsky.graph.list";

/// Check that a string looks like a namespaced identifier
/// (`authority.name.segments` with an optional `#fragment`).
pub fn is_valid(ns: &str) -> bool {
    let (nsid, fragment) = match ns.split_once('#') {
        Some((nsid, fragment)) => (nsid, Some(fragment)),
        None => (ns, None),
    };

    if let Some(fragment) = fragment {
        if fragment.is_empty() || !fragment.chars().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
    }

    let segments: Vec<&str> = nsid.split('.').collect();
    if segments.len() < 3 || nsid.len() > 317 {
        return false;
    }

    segments.iter().all(|segment| {
        !segment.is_empty()
            && segment.len() <= 63
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !segment.starts_with('-')
            && !segment.ends_with('-')
    })
}
