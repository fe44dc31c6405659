// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use stash_core::Method;

fn op(actor: &str, ns: &str, key: &str, method: Method) -> NewOperation {
    NewOperation {
        actor: actor.to_string(),
        namespace: ns.to_string(),
        key: key.to_string(),
        method,
        payload: method.has_payload().then(|| b"{}".to_vec()),
    }
}

fn generic(key: &str) -> NewOperation {
    op("did:example:a", "app.bsky.some.col", key, Method::Create)
}

#[test]
fn append_assigns_increasing_seq() {
    let mut log = OpLog::in_memory();
    let first = log.append(generic("k1")).unwrap();
    let second = log.append(generic("k2")).unwrap();

    assert_eq!(first.seq, 1);
    assert_eq!(second.seq, 2);
    assert_eq!(log.last_seq(), Some(2));
}

#[test]
fn append_echoes_fields() {
    let mut log = OpLog::in_memory();
    let stored = log.append(generic("k1")).unwrap();
    assert_eq!(stored.actor, "did:example:a");
    assert_eq!(stored.namespace, "app.bsky.some.col");
    assert_eq!(stored.key, "k1");
    assert_eq!(stored.method, Method::Create);
    assert_eq!(stored.payload.as_deref(), Some(&b"{}"[..]));
}

#[test]
fn rejects_bad_inputs() {
    let mut log = OpLog::in_memory();
    let cases = [
        (
            op("did:example:a", "bad-collection", "k", Method::Create),
            "operation namespace is invalid NSID",
        ),
        (
            op("bad-did", "app.bsky.some.col", "k", Method::Create),
            "operation actor is invalid DID",
        ),
        (
            op("did:example:a", "app.bsky.some.col", "", Method::Create),
            "operation key is required",
        ),
        (
            NewOperation {
                payload: Some(vec![1, 2, 3]),
                ..op("did:example:a", "app.bsky.some.col", "k", Method::Delete)
            },
            "cannot specify a payload when method is DELETE",
        ),
        (
            NewOperation {
                payload: None,
                ..op("did:example:a", "app.bsky.some.col", "k", Method::Update)
            },
            "payload is required when method is CREATE or UPDATE",
        ),
        (
            NewOperation {
                payload: Some(br#"{"subject":"did:example:b"}"#.to_vec()),
                ..op("did:example:a", stash_core::namespace::MUTE, "3kabc", Method::Create)
            },
            "mute key must equal its subject",
        ),
    ];

    for (input, expected) in cases {
        let err = log.append(input).unwrap_err();
        assert!(
            matches!(err, OpLogError::InvalidOperation(msg) if msg == expected),
            "expected {expected}"
        );
    }
    assert!(log.is_empty());
}

#[test]
fn scan_filters_by_stream_and_cursor() {
    let mut log = OpLog::in_memory();
    log.append(generic("k1")).unwrap();
    log.append(op(
        "did:example:a",
        stash_core::namespace::MUTE,
        "did:example:b",
        Method::Create,
    ))
    .unwrap();
    log.append(generic("k2")).unwrap();

    let all = log.scan(Stream::Operation, None, DEFAULT_SCAN_LIMIT);
    assert_eq!(all.iter().map(|o| o.seq).collect::<Vec<_>>(), vec![1, 3]);

    let after = log.scan(Stream::Operation, Some(1), DEFAULT_SCAN_LIMIT);
    assert_eq!(after.iter().map(|o| o.seq).collect::<Vec<_>>(), vec![3]);

    let mutes = log.scan(Stream::Mute, None, DEFAULT_SCAN_LIMIT);
    assert_eq!(mutes.len(), 1);
    assert_eq!(log.head(Stream::Mute), Some(2));
    assert_eq!(log.head(Stream::Notif), None);
}

#[test]
fn scan_pages_in_order() {
    let mut log = OpLog::in_memory();
    for i in 0..100 {
        log.append(op(
            &format!("did:example:{i}"),
            "app.bsky.some.col",
            "rkey1",
            Method::Create,
        ))
        .unwrap();
    }

    let mut cursor = None;
    let mut seen = Vec::new();
    loop {
        let page = log.scan(Stream::Operation, cursor, 30);
        let Some(last) = page.last() else { break };
        cursor = Some(last.seq);
        seen.extend(page.iter().map(|o| o.seq));
    }

    assert_eq!(seen.len(), 100);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn scan_is_idempotent() {
    let mut log = OpLog::in_memory();
    log.append(generic("k1")).unwrap();
    assert_eq!(
        log.scan(Stream::Operation, Some(0), 10),
        log.scan(Stream::Operation, Some(0), 10)
    );
}

#[test]
fn file_log_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oplog.jsonl");

    {
        let mut log = OpLog::open(&path).unwrap();
        log.append(generic("k1")).unwrap();
        log.append(generic("k2")).unwrap();
    }

    let mut log = OpLog::open(&path).unwrap();
    assert_eq!(log.len(), 2);
    let third = log.append(generic("k3")).unwrap();
    assert_eq!(third.seq, 3);
}

#[test]
fn truncated_tail_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oplog.jsonl");

    {
        let mut log = OpLog::open(&path).unwrap();
        log.append(generic("k1")).unwrap();
    }

    // Simulate a crash part-way through an append
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"stream":"operation","created_at":"#).unwrap();
    }

    let mut log = OpLog::open(&path).unwrap();
    assert_eq!(log.len(), 1);
    log.append(generic("k2")).unwrap();

    let log = OpLog::open(&path).unwrap();
    assert_eq!(log.len(), 2);
}

#[test]
fn checksum_mismatch_stops_replay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oplog.jsonl");

    {
        let mut log = OpLog::open(&path).unwrap();
        log.append(generic("k1")).unwrap();
        log.append(generic("k2")).unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    let tampered = contents.replacen("\"k2\"", "\"kX\"", 1);
    std::fs::write(&path, tampered).unwrap();

    let log = OpLog::open(&path).unwrap();
    assert_eq!(log.len(), 1);
}

#[test]
fn torn_multibyte_tail_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oplog.jsonl");

    {
        let mut log = OpLog::open(&path).unwrap();
        log.append(generic("k1")).unwrap();
    }
    let valid_len = std::fs::metadata(&path).unwrap().len();

    // Cut off inside a multi-byte character
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[b'{', b'"', 0xE2, 0x82]).unwrap();
    }

    let mut log = OpLog::open(&path).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), valid_len);

    log.append(generic("k2")).unwrap();
    assert_eq!(OpLog::open(&path).unwrap().len(), 2);
}

#[test]
fn failed_append_does_not_strand_later_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oplog.jsonl");

    let mut log = OpLog::open(&path).unwrap();
    log.append(generic("k1")).unwrap();

    // A handle that can neither write nor truncate
    let writable = log.file.replace(File::open(&path).unwrap());
    assert!(log.append(generic("k2")).is_err());
    assert_eq!(log.len(), 1);

    // What the failed write left behind
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"stream":"operation","#).unwrap();
    }

    log.file = writable;
    let stored = log.append(generic("k3")).unwrap();
    assert_eq!(stored.seq, 2);
    drop(log);

    let log = OpLog::open(&path).unwrap();
    assert_eq!(log.len(), 2);
    let keys: Vec<String> = log
        .scan(Stream::Operation, None, 10)
        .into_iter()
        .map(|op| op.key)
        .collect();
    assert_eq!(keys, ["k1", "k3"]);
}
