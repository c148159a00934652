//! Version history
//!
//! Committed saves append immutable [`VersionSnapshot`]s. A cursor selects the
//! snapshot being viewed; it moves one step at a time and never branches.

use crate::digest::ContentDigest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

/// Immutable committed snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    index: usize,
    content: String,
    digest: ContentDigest,
    created_at: DateTime<Utc>,
}

impl VersionSnapshot {
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[inline]
    #[must_use]
    pub fn digest(&self) -> ContentDigest {
        self.digest
    }

    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append-only snapshot list with a view cursor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionHistory {
    snapshots: Vec<VersionSnapshot>,
    cursor: usize,
}

impl VersionHistory {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot and move the cursor onto it
    pub fn push(&mut self, content: impl Into<String>) -> &VersionSnapshot {
        let content = content.into();
        let index = self.snapshots.len();
        self.snapshots.push(VersionSnapshot {
            index,
            digest: ContentDigest::of_text(&content),
            content,
            created_at: Utc::now(),
        });
        self.cursor = index;
        &self.snapshots[index]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the snapshot being viewed
    #[inline]
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// Whether the cursor is on the newest snapshot (or there are none)
    #[inline]
    #[must_use]
    pub fn is_current_version(&self) -> bool {
        self.snapshots.is_empty() || self.cursor + 1 == self.snapshots.len()
    }

    /// Whether a move in `direction` would do anything
    #[must_use]
    pub fn can_navigate(&self, direction: Direction) -> bool {
        match direction {
            Direction::Prev => self.cursor > 0,
            Direction::Next => !self.is_current_version(),
        }
    }

    /// Move the cursor one step; disabled moves are no-ops returning `false`
    pub fn navigate(&mut self, direction: Direction) -> bool {
        if !self.can_navigate(direction) {
            return false;
        }
        match direction {
            Direction::Prev => self.cursor -= 1,
            Direction::Next => self.cursor += 1,
        }
        true
    }

    /// Jump the cursor to the newest snapshot
    pub fn view_latest(&mut self) {
        self.cursor = self.snapshots.len().saturating_sub(1);
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&VersionSnapshot> {
        self.snapshots.get(self.cursor)
    }

    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&VersionSnapshot> {
        self.snapshots.last()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&VersionSnapshot> {
        self.snapshots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionSnapshot> {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(n: usize) -> VersionHistory {
        let mut history = VersionHistory::new();
        for i in 0..n {
            history.push(format!("v{i}"));
        }
        history
    }

    #[test]
    fn empty_history_cannot_move() {
        let mut history = VersionHistory::new();
        assert!(history.is_current_version());
        assert!(!history.navigate(Direction::Prev));
        assert!(!history.navigate(Direction::Next));
        assert!(history.current().is_none());
    }

    #[test]
    fn prev_disabled_at_oldest() {
        let mut history = history_of(3);
        assert!(history.navigate(Direction::Prev));
        assert!(history.navigate(Direction::Prev));
        assert_eq!(history.current_index(), 0);
        assert!(!history.can_navigate(Direction::Prev));
        assert!(!history.navigate(Direction::Prev));
        assert_eq!(history.current_index(), 0);
    }

    #[test]
    fn next_disabled_at_newest() {
        let mut history = history_of(2);
        assert!(history.is_current_version());
        assert!(!history.navigate(Direction::Next));

        history.navigate(Direction::Prev);
        assert!(history.navigate(Direction::Next));
        assert_eq!(history.current().unwrap().content(), "v1");
    }

    #[test]
    fn push_moves_cursor_to_new_snapshot() {
        let mut history = history_of(2);
        history.navigate(Direction::Prev);
        let snapshot = history.push("v2");
        assert_eq!(snapshot.index(), 2);
        assert_eq!(history.current_index(), 2);
    }

    #[test]
    fn snapshots_carry_digest_of_content() {
        let history = history_of(1);
        let snapshot = history.latest().unwrap();
        assert_eq!(snapshot.digest(), ContentDigest::of_text("v0"));
    }
}
