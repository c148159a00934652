//! Persistence boundary
//!
//! Durable storage lives outside this crate. Documents cross the boundary as a
//! serde-serializable [`DocumentPayload`] handed to a [`DocumentStore`].

use crate::document::{ArtifactDocument, ArtifactKind, DocumentId};
use crate::error::ArtifactError;
use crate::metadata::ArtifactMetadata;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Persisted form of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub title: String,
    pub content: String,
    pub kind: ArtifactKind,
    pub metadata: ArtifactMetadata,
}

impl ArtifactDocument {
    /// Persisted form of the working copy
    #[must_use]
    pub fn to_payload(&self) -> DocumentPayload {
        DocumentPayload {
            title: self.title().to_owned(),
            content: self.content().to_owned(),
            kind: self.kind(),
            metadata: self.metadata().clone(),
        }
    }

    /// Rebuild a saved document as a single completed version
    #[must_use]
    pub fn from_payload(id: DocumentId, payload: DocumentPayload) -> Self {
        let DocumentPayload {
            title,
            content,
            kind,
            metadata,
        } = payload;
        let metadata = if metadata.kind() == kind {
            metadata
        } else {
            tracing::warn!(doc = %id, %kind, found = %metadata.kind(), "metadata kind mismatch, resetting");
            ArtifactMetadata::for_kind(kind)
        };
        ArtifactDocument::restore(id, title, content, metadata)
    }
}

/// Durable document storage
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Save a payload, replacing any earlier one with the same id
    async fn save(&self, id: DocumentId, payload: &DocumentPayload) -> Result<(), ArtifactError>;

    /// Load a payload
    ///
    /// # Errors
    /// [`ArtifactError::NotFound`] when nothing was saved under `id`.
    async fn load(&self, id: DocumentId) -> Result<DocumentPayload, ArtifactError>;
}

/// Process-local store keeping payloads as JSON text
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<DocumentId, String>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
    async fn save(&self, id: DocumentId, payload: &DocumentPayload) -> Result<(), ArtifactError> {
        let encoded = serde_json::to_string(payload)?;
        self.entries.insert(id, encoded);
        tracing::debug!(doc = %id, "document saved");
        Ok(())
    }

    async fn load(&self, id: DocumentId) -> Result<DocumentPayload, ArtifactError> {
        let encoded = self
            .entries
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ArtifactError::NotFound(id))?;
        Ok(serde_json::from_str(&encoded)?)
    }
}
