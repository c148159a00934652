//! Run console
//!
//! Every execution of a code artifact publishes a [`RunRecord`] under a fresh
//! [`RunId`]. The [`RunConsole`] keeps at most one record per id: publishing an
//! update removes the old record and appends the new one, so the most recently
//! touched run is always last.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique run identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one run
///
/// Moves forward only. `LoadingPackages` may repeat before the run settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    LoadingPackages,
    Completed,
    Failed,
}

impl RunStatus {
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    const fn rank(self) -> u8 {
        match self {
            RunStatus::InProgress => 0,
            RunStatus::LoadingPackages => 1,
            RunStatus::Completed | RunStatus::Failed => 2,
        }
    }

    /// Whether a record in this status may be replaced by one in `next`
    #[inline]
    #[must_use]
    pub const fn can_advance_to(self, next: RunStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunStatus::InProgress => "in_progress",
            RunStatus::LoadingPackages => "loading_packages",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured output entry
///
/// Images are self-describing data URIs (`data:image/png;base64,...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum OutputContent {
    Text(String),
    Image(String),
}

impl OutputContent {
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Classify a raw stdout chunk
    ///
    /// A chunk is an image only when it is a `data:image/<subtype>;base64,`
    /// URI whose payload decodes. Anything else, including truncated
    /// payloads, stays text.
    #[must_use]
    pub fn classify(chunk: impl Into<String>) -> Self {
        let chunk = chunk.into();
        if is_image_data_uri(&chunk) {
            Self::Image(chunk)
        } else {
            Self::Text(chunk)
        }
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Text(v) | Self::Image(v) => v,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

fn is_image_data_uri(chunk: &str) -> bool {
    let Some(rest) = chunk.strip_prefix("data:image/") else {
        return false;
    };
    let Some((subtype, payload)) = rest.split_once(";base64,") else {
        return false;
    };
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric() || "+.-".contains(c)) {
        return false;
    }
    let payload = payload.trim_end();
    !payload.is_empty() && base64::engine::general_purpose::STANDARD.decode(payload).is_ok()
}

/// Snapshot of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    pub status: RunStatus,
    pub contents: Vec<OutputContent>,
}

impl RunRecord {
    #[must_use]
    pub fn in_progress(id: RunId) -> Self {
        Self {
            id,
            status: RunStatus::InProgress,
            contents: Vec::new(),
        }
    }

    /// Package loader progress; the message replaces all contents
    #[must_use]
    pub fn loading_packages(id: RunId, message: impl Into<String>) -> Self {
        Self {
            id,
            status: RunStatus::LoadingPackages,
            contents: vec![OutputContent::text(message)],
        }
    }

    #[must_use]
    pub fn completed(id: RunId, contents: Vec<OutputContent>) -> Self {
        Self {
            id,
            status: RunStatus::Completed,
            contents,
        }
    }

    #[must_use]
    pub fn failed(id: RunId, message: impl Into<String>) -> Self {
        Self {
            id,
            status: RunStatus::Failed,
            contents: vec![OutputContent::text(message)],
        }
    }

    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Ordered run log, at most one record per id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunConsole {
    records: Vec<RunRecord>,
}

impl RunConsole {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    ///
    /// Any record with the same id is removed and the new one appended.
    /// Backward status transitions (and updates to settled runs) are
    /// rejected and return `false`.
    pub fn upsert(&mut self, record: RunRecord) -> bool {
        if let Some(existing) = self.get(record.id) {
            if !existing.status.can_advance_to(record.status) {
                tracing::warn!(
                    run = %record.id,
                    from = %existing.status,
                    to = %record.status,
                    "ignoring run record update"
                );
                return false;
            }
        }
        self.records.retain(|r| r.id != record.id);
        self.records.push(record);
        true
    }

    #[must_use]
    pub fn get(&self, id: RunId) -> Option<&RunRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Empty the log; in-flight runs keep publishing into it
    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&RunRecord> {
        self.records.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn valid_png_uri_is_image() {
        assert!(OutputContent::classify(PIXEL).is_image());
    }

    #[test]
    fn truncated_payload_is_text() {
        let truncated = &PIXEL[..PIXEL.len() - 3];
        assert_eq!(OutputContent::classify(truncated), OutputContent::text(truncated));
        assert!(!OutputContent::classify("data:image/png;base64,").is_image());
        assert!(!OutputContent::classify("data:text/plain;base64,aGk=").is_image());
        assert!(!OutputContent::classify("hello").is_image());
    }

    #[test]
    fn transitions_only_move_forward() {
        assert!(RunStatus::InProgress.can_advance_to(RunStatus::LoadingPackages));
        assert!(RunStatus::LoadingPackages.can_advance_to(RunStatus::LoadingPackages));
        assert!(RunStatus::LoadingPackages.can_advance_to(RunStatus::Failed));
        assert!(!RunStatus::LoadingPackages.can_advance_to(RunStatus::InProgress));
        assert!(!RunStatus::Completed.can_advance_to(RunStatus::Failed));
    }

    #[test]
    fn upsert_moves_updated_record_to_end() {
        let (x, a, b) = (RunId::new(), RunId::new(), RunId::new());
        let mut console = RunConsole::new();
        console.upsert(RunRecord::in_progress(x));
        console.upsert(RunRecord::in_progress(a));
        console.upsert(RunRecord::in_progress(b));

        console.upsert(RunRecord::completed(x, vec![OutputContent::text("done")]));

        let order: Vec<RunId> = console.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![a, b, x]);
        assert_eq!(console.get(x).unwrap().status, RunStatus::Completed);
    }

    #[test]
    fn settled_runs_reject_updates() {
        let id = RunId::new();
        let mut console = RunConsole::new();
        console.upsert(RunRecord::failed(id, "boom"));
        assert!(!console.upsert(RunRecord::in_progress(id)));
        assert_eq!(console.get(id).unwrap().contents, vec![OutputContent::text("boom")]);
    }

    #[test]
    fn output_serializes_with_type_and_value() {
        let json = serde_json::to_value(OutputContent::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "value": "hi"}));
    }

    proptest! {
        #[test]
        fn console_never_holds_duplicate_ids(ops in prop::collection::vec((0usize..4, 0u8..4), 0..40)) {
            let ids: Vec<RunId> = (0..4).map(|_| RunId::new()).collect();
            let mut console = RunConsole::new();
            for (slot, status) in ops {
                let id = ids[slot];
                let record = match status {
                    0 => RunRecord::in_progress(id),
                    1 => RunRecord::loading_packages(id, "Loading numpy"),
                    2 => RunRecord::completed(id, Vec::new()),
                    _ => RunRecord::failed(id, "err"),
                };
                console.upsert(record);
            }
            let mut seen: Vec<RunId> = console.iter().map(|r| r.id).collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);
        }
    }
}
