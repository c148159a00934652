//! Artifact documents
//!
//! An [`ArtifactDocument`] holds the working copy of one generated artifact.
//! The generation pipeline sends cumulative snapshots; each one replaces the
//! working copy, re-detects the language and may reveal the artifact. Saves
//! append immutable snapshots to the [`VersionHistory`].
//!
//! Delta application is total: shrinking, flat or empty snapshots are applied
//! as-is and never produce an error.

use crate::classifier::LanguageTable;
use crate::console::{RunConsole, RunRecord};
use crate::error::ArtifactError;
use crate::language::LanguageTag;
use crate::metadata::{ArtifactMetadata, WebBuffer};
use crate::version::{Direction, VersionHistory};
use crate::visibility::{LengthWindow, VisibilityPolicy};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Generate new document ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of artifact, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Text,
    Code,
    Web,
    Image,
    Sheet,
}

impl ArtifactKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Text => "text",
            ArtifactKind::Code => "code",
            ArtifactKind::Web => "web",
            ArtifactKind::Image => "image",
            ArtifactKind::Sheet => "sheet",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Streaming state of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    #[default]
    Idle,
    Streaming,
    Complete,
}

/// One generated artifact
#[derive(Debug, Clone)]
pub struct ArtifactDocument {
    id: DocumentId,
    title: String,
    content: String,
    status: StreamStatus,
    is_visible: bool,
    history: VersionHistory,
    metadata: ArtifactMetadata,
    policy: Arc<dyn VisibilityPolicy>,
    table: Arc<LanguageTable>,
}

impl ArtifactDocument {
    /// Create an empty, hidden document
    #[must_use]
    pub fn new(title: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            id: DocumentId::new(),
            title: title.into(),
            content: String::new(),
            status: StreamStatus::Idle,
            is_visible: false,
            history: VersionHistory::new(),
            metadata: ArtifactMetadata::for_kind(kind),
            policy: Arc::new(LengthWindow::default()),
            table: LanguageTable::shared_builtin(),
        }
    }

    /// Rebuild a document from persisted parts
    #[must_use]
    pub fn restore(id: DocumentId, title: impl Into<String>, content: impl Into<String>, metadata: ArtifactMetadata) -> Self {
        let content = content.into();
        let mut history = VersionHistory::new();
        history.push(content.clone());
        Self {
            id,
            title: title.into(),
            content,
            status: StreamStatus::Complete,
            is_visible: true,
            history,
            metadata,
            policy: Arc::new(LengthWindow::default()),
            table: LanguageTable::shared_builtin(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = id;
        self
    }

    /// Replace the visibility policy
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn VisibilityPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the classifier table
    #[must_use]
    pub fn with_table(mut self, table: Arc<LanguageTable>) -> Self {
        self.table = table;
        self
    }

    /// Attach a filename to a code artifact; ignored for other kinds
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        if let Some(code) = self.metadata.as_code_mut() {
            code.filename = Some(filename.into());
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.metadata.kind()
    }

    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> StreamStatus {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    #[inline]
    #[must_use]
    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    #[inline]
    #[must_use]
    pub fn table(&self) -> &LanguageTable {
        &self.table
    }

    /// Detected language for code and web artifacts
    #[inline]
    #[must_use]
    pub fn language(&self) -> Option<LanguageTag> {
        self.metadata.language()
    }

    /// Content of the version being viewed
    ///
    /// The working copy when the cursor is on the newest version or nothing
    /// has been committed yet.
    #[must_use]
    pub fn displayed_content(&self) -> &str {
        if self.history.is_current_version() {
            return &self.content;
        }
        self.history.current().map_or(&self.content, |snapshot| snapshot.content())
    }

    /// Apply one cumulative snapshot from the generation stream
    ///
    /// Returns `true` when this delta revealed the document.
    pub fn apply_delta(&mut self, content: &str) -> bool {
        let prev_len = self.content.chars().count();
        let new_len = content.chars().count();

        content.clone_into(&mut self.content);
        self.status = StreamStatus::Streaming;

        match &mut self.metadata {
            ArtifactMetadata::Code(code) => {
                code.reclassify(&self.table, content);
            }
            ArtifactMetadata::Web(web) => {
                let routed = web.route_delta(&self.table, content);
                tracing::trace!(doc = %self.id, buffer = ?routed, "web delta routed");
            }
            _ => {}
        }

        let revealed = !self.is_visible && self.policy.should_become_visible(prev_len, new_len, self.status);
        if revealed {
            self.is_visible = true;
            tracing::debug!(doc = %self.id, len = new_len, "artifact became visible");
        }
        tracing::trace!(doc = %self.id, prev_len, new_len, language = ?self.language(), "delta applied");
        revealed
    }

    /// Snapshot the working copy and mark the stream complete
    ///
    /// The first commit of a web document also picks the edit buffer from the
    /// detected language.
    pub fn commit_version(&mut self) -> usize {
        let first = self.history.is_empty();
        let index = self.history.push(self.content.clone()).index();
        self.status = StreamStatus::Complete;
        if first {
            if let Some(web) = self.metadata.as_web_mut() {
                web.reset_active();
                tracing::debug!(doc = %self.id, buffer = ?web.active, "initial web buffer selected");
            }
        }
        tracing::debug!(doc = %self.id, version = index, "version committed");
        index
    }

    /// Replace the working copy with a user edit and save it
    pub fn apply_edit(&mut self, content: impl Into<String>) -> usize {
        self.content = content.into();
        if let ArtifactMetadata::Code(code) = &mut self.metadata {
            code.reclassify(&self.table, &self.content);
        }
        self.commit_version()
    }

    /// Move the version cursor; `false` when the move is disabled
    pub fn navigate_version(&mut self, direction: Direction) -> bool {
        self.history.navigate(direction)
    }

    #[inline]
    #[must_use]
    pub fn can_navigate(&self, direction: Direction) -> bool {
        self.history.can_navigate(direction)
    }

    /// Jump back to the newest version
    pub fn view_latest_version(&mut self) {
        self.history.view_latest();
    }

    /// Publish a run record into the code console
    ///
    /// Non-code documents have no console; the record is dropped.
    pub fn record_run(&mut self, record: RunRecord) -> bool {
        match self.metadata.as_code_mut() {
            Some(code) => code.record_run(record),
            None => {
                tracing::warn!(doc = %self.id, kind = %self.kind(), run = %record.id, "dropping run record");
                false
            }
        }
    }

    #[must_use]
    pub fn outputs(&self) -> Option<&RunConsole> {
        self.metadata.as_code().map(|code| &code.outputs)
    }

    /// Empty the code console
    pub fn clear_outputs(&mut self) -> Result<(), ArtifactError> {
        let kind = self.kind();
        let code = self
            .metadata
            .as_code_mut()
            .ok_or_else(|| ArtifactError::unsupported("clear_outputs", kind))?;
        code.outputs.clear();
        Ok(())
    }

    /// Flip the preview flag
    pub fn toggle_preview(&mut self) -> Result<bool, ArtifactError> {
        match &mut self.metadata {
            ArtifactMetadata::Code(code) => code.toggle_preview(),
            ArtifactMetadata::Web(web) => Ok(web.toggle_preview()),
            other => Err(ArtifactError::unsupported("toggle_preview", other.kind())),
        }
    }

    /// Select the web buffer user edits go to
    pub fn set_active_buffer(&mut self, which: WebBuffer) -> Result<(), ArtifactError> {
        let kind = self.kind();
        let web = self
            .metadata
            .as_web_mut()
            .ok_or_else(|| ArtifactError::unsupported("set_active_buffer", kind))?;
        web.set_active_buffer(which);
        Ok(())
    }

    /// Overwrite the active web buffer with a user edit
    pub fn edit_active_buffer(&mut self, text: impl Into<String>) -> Result<(), ArtifactError> {
        let kind = self.kind();
        let web = self
            .metadata
            .as_web_mut()
            .ok_or_else(|| ArtifactError::unsupported("edit_active_buffer", kind))?;
        web.edit_active_buffer(text);
        Ok(())
    }

    /// Wrap for sharing with an execution engine
    #[must_use]
    pub fn into_shared(self) -> SharedDocument {
        SharedDocument::new(self)
    }
}

/// Document shared between the editing surface and running executions
#[derive(Debug, Clone)]
pub struct SharedDocument(Arc<RwLock<ArtifactDocument>>);

impl SharedDocument {
    #[must_use]
    pub fn new(doc: ArtifactDocument) -> Self {
        Self(Arc::new(RwLock::new(doc)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ArtifactDocument> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ArtifactDocument> {
        self.0.write()
    }

    /// Copy of the current working content
    #[must_use]
    pub fn content(&self) -> String {
        self.0.read().content().to_owned()
    }
}
