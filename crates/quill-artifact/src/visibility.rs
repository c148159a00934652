//! Visibility policies
//!
//! A streaming artifact starts hidden and is revealed once enough content has
//! arrived. The decision is a pluggable predicate so the trigger can be tuned
//! without touching the document model.

use crate::document::StreamStatus;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Decides whether a delta should reveal the artifact
///
/// Only consulted while the artifact is hidden; once visible it stays visible.
pub trait VisibilityPolicy: Send + Sync + Debug {
    /// # Arguments
    /// * `prev_len` - character count before the delta
    /// * `new_len` - character count after the delta
    /// * `status` - stream status the delta is applied under
    fn should_become_visible(&self, prev_len: usize, new_len: usize, status: StreamStatus) -> bool;
}

/// Reveal when the new length lands strictly inside `(lower, upper)`
///
/// A delta that jumps over the window never triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthWindow {
    pub lower: usize,
    pub upper: usize,
}

impl LengthWindow {
    /// Default lower bound (exclusive)
    pub const DEFAULT_LOWER: usize = 300;
    /// Default upper bound (exclusive)
    pub const DEFAULT_UPPER: usize = 310;

    #[inline]
    #[must_use]
    pub const fn new(lower: usize, upper: usize) -> Self {
        Self { lower, upper }
    }

    /// Whether a length falls strictly inside the window
    #[inline]
    #[must_use]
    pub const fn contains(&self, len: usize) -> bool {
        len > self.lower && len < self.upper
    }
}

impl Default for LengthWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOWER, Self::DEFAULT_UPPER)
    }
}

impl VisibilityPolicy for LengthWindow {
    fn should_become_visible(&self, _prev_len: usize, new_len: usize, status: StreamStatus) -> bool {
        status == StreamStatus::Streaming && self.contains(new_len)
    }
}

/// Reveal as soon as any content arrives while streaming
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl VisibilityPolicy for Immediate {
    fn should_become_visible(&self, _prev_len: usize, new_len: usize, status: StreamStatus) -> bool {
        status == StreamStatus::Streaming && new_len > 0
    }
}

/// Reveal the first time the length reaches a threshold, even if a delta skips past it
#[derive(Debug, Clone, Copy)]
pub struct Threshold(pub usize);

impl VisibilityPolicy for Threshold {
    fn should_become_visible(&self, _prev_len: usize, new_len: usize, status: StreamStatus) -> bool {
        status == StreamStatus::Streaming && new_len >= self.0
    }
}
