//! The indexed, searchable snapshot store.
//!
//! Append-only; safe for concurrent appends and reads (readers never block
//! the appender) via a `parking_lot::RwLock`.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One finalized history entry: a user-input epoch paired with the
/// command-output epoch it produced, both rendered at the geometry active
/// when they were captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub timestamp: f64,
    pub columns: u16,
    pub lines: u16,
    pub user_view: String,
    pub command_view: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Index out of range for {name}, length: {length}")]
    OutOfRange { name: String, length: usize },
}

/// Which field(s) a search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIn {
    User,
    Command,
    Both,
}

impl SearchIn {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user_view" | "user" => Some(Self::User),
            "command_view" | "command" => Some(Self::Command),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Ordered, append-only sequence of [`Snapshot`]s with negative indexing
/// and substring search.
pub struct SnapshotStore {
    name: String,
    rows: RwLock<Vec<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Append a snapshot, returning the new total length.
    pub fn append(&self, snapshot: Snapshot) -> usize {
        let mut rows = self.rows.write();
        rows.push(snapshot);
        rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `index >= 0` is zero-based from the front; `index < 0` counts back
    /// from the end (`-1` is the most recently appended snapshot).
    pub fn get(&self, index: i64) -> Result<Snapshot, StoreError> {
        let rows = self.rows.read();
        let len = rows.len();

        let resolved = if index >= 0 {
            index as usize
        } else {
            let from_end = (-index) as usize;
            if from_end > len {
                return Err(StoreError::OutOfRange {
                    name: self.name.clone(),
                    length: len,
                });
            }
            len - from_end
        };

        rows.get(resolved).cloned().ok_or(StoreError::OutOfRange {
            name: self.name.clone(),
            length: len,
        })
    }

    /// Case-sensitive substring search, most-recent-first, capped at
    /// `limit` (defaults to 10 when `None`).
    pub fn search(&self, pattern: &str, search_in: SearchIn, limit: Option<usize>) -> Vec<(usize, Snapshot)> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let rows = self.rows.read();

        rows.iter()
            .enumerate()
            .rev()
            .filter(|(_, snap)| match search_in {
                SearchIn::User => snap.user_view.contains(pattern),
                SearchIn::Command => snap.command_view.contains(pattern),
                SearchIn::Both => snap.user_view.contains(pattern) || snap.command_view.contains(pattern),
            })
            .take(limit)
            .map(|(i, snap)| (i, snap.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(user: &str, command: &str) -> Snapshot {
        Snapshot {
            timestamp: 0.0,
            columns: 80,
            lines: 24,
            user_view: user.to_string(),
            command_view: command.to_string(),
        }
    }

    #[test]
    fn negative_indexing_matches_positive_from_the_end() {
        let store = SnapshotStore::new("history");
        store.append(snap("a", "A"));
        store.append(snap("b", "B"));
        store.append(snap("c", "C"));

        assert_eq!(store.get(-1).unwrap().user_view, "c");
        assert_eq!(store.get(-3).unwrap().user_view, "a");
        for i in 0..store.len() as i64 {
            assert_eq!(store.get(i).unwrap(), store.get(i - store.len() as i64).unwrap());
        }
    }

    #[test]
    fn out_of_range_reports_current_length() {
        let store = SnapshotStore::new("history");
        store.append(snap("a", "A"));
        store.append(snap("b", "B"));
        store.append(snap("c", "C"));

        let err = store.get(-4).unwrap_err();
        assert_eq!(err, StoreError::OutOfRange { name: "history".into(), length: 3 });
    }

    #[test]
    fn empty_store_out_of_range_reports_zero() {
        let store = SnapshotStore::new("history");
        let err = store.get(0).unwrap_err();
        assert_eq!(err, StoreError::OutOfRange { name: "history".into(), length: 0 });
    }

    #[test]
    fn search_is_most_recent_first_and_respects_limit() {
        let store = SnapshotStore::new("history");
        store.append(snap("git status", ""));
        store.append(snap("ls", ""));
        store.append(snap("grep foo", ""));

        let results = store.search("g", SearchIn::Both, Some(10));
        let users: Vec<_> = results.iter().map(|(_, s)| s.user_view.as_str()).collect();
        assert_eq!(users, vec!["grep foo", "git status"]);
    }

    #[test]
    fn search_matches_either_field_in_both_mode() {
        let store = SnapshotStore::new("history");
        store.append(snap("ls", "contains-needle-in-output"));
        store.append(snap("needle in input", "unrelated"));

        let results = store.search("needle", SearchIn::Both, None);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn search_limit_is_enforced() {
        let store = SnapshotStore::new("history");
        for _ in 0..20 {
            store.append(snap("match", ""));
        }
        let results = store.search("match", SearchIn::Both, Some(3));
        assert_eq!(results.len(), 3);
    }
}
