// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handle to the replica's store

use crate::tables::{BookmarkRow, MuteKind, MuteRow, PostAggRow, Tables};
use std::ops::Deref;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to the local store
///
/// Single statements go through [`Database::write`]. Work that must be
/// all-or-nothing goes through [`Database::transaction`].
#[derive(Clone, Default)]
pub struct Database {
    tables: Arc<RwLock<Tables>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` in a transaction, undoing its writes unless it returns `Ok`
    ///
    /// Writers are serialized for the duration of the transaction, so
    /// readers observe either none or all of its effects. Writes are also
    /// undone if `f` panics.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut guard = self.write();
        let mut tx = Transaction {
            tables: &mut *guard,
            undo: Vec::new(),
        };
        let value = f(&mut tx)?;
        tx.undo.clear();
        Ok(value)
    }

    /// Copy of the current tables
    pub fn snapshot(&self) -> Tables {
        self.read().clone()
    }
}

enum Undo {
    Bookmark {
        creator: String,
        key: String,
        previous: Option<BookmarkRow>,
    },
    PostAgg {
        uri: String,
        previous: Option<PostAggRow>,
    },
    Mutes {
        kind: MuteKind,
        removed: Vec<MuteRow>,
    },
}

/// Write access to the tables inside [`Database::transaction`]
///
/// Reads go straight to the tables. Each write records what it replaced,
/// and dropping an uncommitted transaction restores it in reverse order.
pub struct Transaction<'a> {
    tables: &'a mut Tables,
    undo: Vec<Undo>,
}

impl Transaction<'_> {
    pub fn upsert_bookmark(&mut self, row: BookmarkRow) {
        let (creator, key) = (row.creator.clone(), row.key.clone());
        let previous = self.tables.upsert_bookmark(row);
        self.undo.push(Undo::Bookmark {
            creator,
            key,
            previous,
        });
    }

    pub fn delete_bookmark(&mut self, creator: &str, key: &str) -> Option<BookmarkRow> {
        let removed = self.tables.delete_bookmark(creator, key)?;
        self.undo.push(Undo::Bookmark {
            creator: creator.to_string(),
            key: key.to_string(),
            previous: Some(removed.clone()),
        });
        Some(removed)
    }

    pub fn set_bookmark_count(&mut self, uri: &str, count: u64) {
        let previous = self.tables.post_aggs.get(uri).cloned();
        self.tables.set_bookmark_count(uri, count);
        self.undo.push(Undo::PostAgg {
            uri: uri.to_string(),
            previous,
        });
    }

    pub fn clear_mutes(&mut self, kind: MuteKind, muted_by: &str) -> usize {
        let removed: Vec<MuteRow> = self
            .tables
            .mutes_by(kind, muted_by)
            .into_iter()
            .cloned()
            .collect();
        let cleared = self.tables.clear_mutes(kind, muted_by);
        self.undo.push(Undo::Mutes { kind, removed });
        cleared
    }
}

impl Deref for Transaction<'_> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        self.tables
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::Bookmark {
                    creator,
                    key,
                    previous,
                } => match previous {
                    Some(row) => {
                        self.tables.upsert_bookmark(row);
                    }
                    None => {
                        self.tables.delete_bookmark(&creator, &key);
                    }
                },
                Undo::PostAgg { uri, previous } => match previous {
                    Some(row) => {
                        self.tables.post_aggs.insert(uri, row);
                    }
                    None => {
                        self.tables.post_aggs.remove(&uri);
                    }
                },
                Undo::Mutes { kind, removed } => {
                    for row in removed {
                        self.tables.insert_mute(kind, row);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
