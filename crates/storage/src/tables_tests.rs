// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn private_row(payload: &str, time: DateTime<Utc>) -> PrivateDataRow {
    PrivateDataRow {
        actor: "did:example:a".to_string(),
        namespace: "app.bsky.some.col".to_string(),
        key: "k1".to_string(),
        payload: payload.to_string(),
        indexed_at: time,
        updated_at: time,
    }
}

fn bookmark(creator: &str, key: &str, uri: &str) -> BookmarkRow {
    BookmarkRow {
        creator: creator.to_string(),
        key: key.to_string(),
        subject_uri: uri.to_string(),
        subject_cid: "bafy".to_string(),
        indexed_at: at(0),
    }
}

fn mute(by: &str, subject: &str) -> MuteRow {
    MuteRow {
        muted_by: by.to_string(),
        subject: subject.to_string(),
        created_at: at(0),
    }
}

#[test]
fn private_data_upsert_keeps_indexed_at() {
    let mut tables = Tables::default();
    tables.upsert_private_data(private_row(r#"{"v":1}"#, at(0)));
    tables.upsert_private_data(private_row(r#"{"v":2}"#, at(10)));

    let row = tables
        .private_data("did:example:a", "app.bsky.some.col", "k1")
        .unwrap();
    assert_eq!(row.payload, r#"{"v":2}"#);
    assert_eq!(row.indexed_at, at(0));
    assert_eq!(row.updated_at, at(10));
    assert_eq!(tables.private_data.len(), 1);
}

#[test]
fn private_data_delete_reports_presence() {
    let mut tables = Tables::default();
    tables.upsert_private_data(private_row("{}", at(0)));

    assert!(tables.delete_private_data("did:example:a", "app.bsky.some.col", "k1"));
    assert!(!tables.delete_private_data("did:example:a", "app.bsky.some.col", "k1"));
}

#[test]
fn bookmark_count_counts_source_rows() {
    let mut tables = Tables::default();
    tables.upsert_bookmark(bookmark("did:example:a", "k1", "at://p/1"));
    tables.upsert_bookmark(bookmark("did:example:b", "k1", "at://p/1"));
    tables.upsert_bookmark(bookmark("did:example:a", "k2", "at://p/2"));
    // Same (creator, key) replaces rather than duplicates
    tables.upsert_bookmark(bookmark("did:example:a", "k1", "at://p/1"));

    assert_eq!(tables.count_bookmarks("at://p/1"), 2);
    assert_eq!(tables.count_bookmarks("at://p/2"), 1);
    assert_eq!(tables.count_bookmarks("at://p/3"), 0);
    assert_eq!(tables.bookmarks_by("did:example:a").len(), 2);
}

#[test]
fn bookmark_count_follows_subject_changes() {
    let mut tables = Tables::default();
    tables.upsert_bookmark(bookmark("did:example:a", "k1", "at://p/1"));
    let replaced = tables.upsert_bookmark(bookmark("did:example:a", "k1", "at://p/2"));

    assert_eq!(replaced.unwrap().subject_uri, "at://p/1");
    assert_eq!(tables.count_bookmarks("at://p/1"), 0);
    assert_eq!(tables.count_bookmarks("at://p/2"), 1);

    tables.delete_bookmark("did:example:a", "k1");
    assert_eq!(tables.count_bookmarks("at://p/2"), 0);
    assert_eq!(tables, Tables::default());
}

#[test]
fn bookmark_count_defaults_to_zero() {
    let mut tables = Tables::default();
    assert_eq!(tables.bookmark_count("at://p/1"), 0);

    tables.set_bookmark_count("at://p/1", 3);
    tables.set_bookmark_count("at://p/1", 1);
    assert_eq!(tables.bookmark_count("at://p/1"), 1);
}

#[test]
fn draft_update_requires_existing_row() {
    let mut tables = Tables::default();
    assert!(!tables.update_draft("did:example:a", "d1", "{}".into(), at(5)));
    assert!(tables.draft("did:example:a", "d1").is_none());

    tables.upsert_draft(DraftRow {
        creator: "did:example:a".to_string(),
        key: "d1".to_string(),
        payload: "old".to_string(),
        created_at: at(0),
        updated_at: at(0),
    });
    assert!(tables.update_draft("did:example:a", "d1", "new".into(), at(5)));

    let draft = tables.draft("did:example:a", "d1").unwrap();
    assert_eq!(draft.payload, "new");
    assert_eq!(draft.created_at, at(0));
    assert_eq!(draft.updated_at, at(5));
    assert_eq!(tables.count_drafts("did:example:a"), 1);
}

#[test]
fn actor_insert_does_not_overwrite() {
    let mut tables = Tables::default();
    let mut first = ActorRow::new("did:example:a", at(0));
    first.handle = Some("alice.test".to_string());
    tables.insert_actor(first);
    tables.insert_actor(ActorRow::new("did:example:a", at(9)));

    let actor = tables.actor("did:example:a").unwrap();
    assert_eq!(actor.handle.as_deref(), Some("alice.test"));
    assert_eq!(actor.indexed_at, at(0));
}

#[test]
fn priority_notifs_initialises_last_seen_once() {
    let mut tables = Tables::default();
    tables.upsert_priority_notifs("did:example:a", true, at(0));
    tables.upsert_priority_notifs("did:example:a", false, at(30));

    let state = tables.actor_state("did:example:a").unwrap();
    assert!(!state.priority_notifs);
    assert_eq!(state.last_seen_notifs, at(0));
}

#[test]
fn mutes_are_partitioned_by_kind() {
    let mut tables = Tables::default();
    tables.insert_mute(MuteKind::Actor, mute("did:example:a", "did:example:b"));
    tables.insert_mute(MuteKind::List, mute("did:example:a", "at://l/1"));
    tables.insert_mute(MuteKind::Thread, mute("did:example:a", "at://t/1"));
    tables.insert_mute(MuteKind::Actor, mute("did:example:z", "did:example:b"));

    assert!(tables.is_muted(MuteKind::Actor, "did:example:a", "did:example:b"));
    assert!(!tables.is_muted(MuteKind::List, "did:example:a", "did:example:b"));

    assert_eq!(tables.clear_mutes(MuteKind::Actor, "did:example:a"), 1);
    assert_eq!(tables.clear_mutes(MuteKind::List, "did:example:a"), 1);
    assert!(tables.is_muted(MuteKind::Thread, "did:example:a", "at://t/1"));
    assert!(tables.is_muted(MuteKind::Actor, "did:example:z", "did:example:b"));

    assert!(tables.delete_mute(MuteKind::Thread, "did:example:a", "at://t/1"));
    assert!(tables.mutes_by(MuteKind::Thread, "did:example:a").is_empty());
}

#[test]
fn cursor_never_moves_backwards() {
    let mut tables = Tables::default();
    assert_eq!(tables.cursor(Stream::Mute), None);

    tables.advance_cursor(Stream::Mute, 7);
    tables.advance_cursor(Stream::Mute, 3);
    tables.advance_cursor(Stream::Notif, 1);

    assert_eq!(tables.cursor(Stream::Mute), Some(7));
    assert_eq!(tables.cursor(Stream::Notif), Some(1));
    assert_eq!(tables.cursor(Stream::Operation), None);
}
