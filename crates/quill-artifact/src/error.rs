//! Error types for the artifact model
//!
//! Delta application and visibility decisions are total and never produce
//! these errors. They cover the surrounding operations:
//! - Registering malformed language signatures
//! - Requesting a preview for content that has none
//! - Kind-specific operations on the wrong kind of document
//! - The persistence boundary

use crate::document::{ArtifactKind, DocumentId};
use crate::language::LanguageTag;

/// Main artifact error type
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// A signature pattern did not compile
    #[error("invalid signature for {language}: {source}")]
    InvalidSignature {
        language: LanguageTag,
        #[source]
        source: regex::Error,
    },

    /// Preview requested for content that cannot be previewed
    #[error("preview not available for {0} code")]
    PreviewUnavailable(LanguageTag),

    /// Operation only defined for another artifact kind
    #[error("operation '{operation}' is not supported for {kind} artifacts")]
    UnsupportedForKind {
        operation: &'static str,
        kind: ArtifactKind,
    },

    /// Document missing from a store
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Payload (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ArtifactError {
    /// Create kind mismatch error
    #[inline]
    #[must_use]
    pub fn unsupported(operation: &'static str, kind: ArtifactKind) -> Self {
        Self::UnsupportedForKind { operation, kind }
    }
}
