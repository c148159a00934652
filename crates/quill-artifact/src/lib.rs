//! Quill Artifact Model
//!
//! Streaming, versioned artifact documents with deterministic language
//! detection and visibility decisions.
//!
//! # Core Concepts
//!
//! - [`ArtifactDocument`]: working content, stream status, version history and
//!   kind-specific metadata of one generated artifact
//! - [`LanguageTable`] / [`classify`]: filename and content based language detection
//! - [`VisibilityPolicy`]: decides when a streaming artifact is worth showing
//! - [`RunConsole`]: ordered log of execution [`RunRecord`]s keyed by [`RunId`]
//! - [`StreamEvent`]: inbound delta protocol from the generation pipeline
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_artifact::{ArtifactDocument, ArtifactKind, LanguageTag};
//!
//! let mut doc = ArtifactDocument::new("fib", ArtifactKind::Code);
//! doc.apply_delta("import math\n");
//! doc.apply_delta("import math\ndef fib(n):\n    return n\n");
//! doc.commit_version();
//!
//! assert_eq!(doc.language(), Some(LanguageTag::Python));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod classifier;
pub mod console;
pub mod digest;
pub mod document;
pub mod error;
pub mod language;
pub mod metadata;
pub mod preview;
pub mod store;
pub mod stream;
pub mod version;
pub mod visibility;

pub use classifier::{classify, score_signatures, LanguageProfile, LanguageTable};
pub use console::{OutputContent, RunConsole, RunId, RunRecord, RunStatus};
pub use digest::{ContentDigest, DigestError};
pub use document::{ArtifactDocument, ArtifactKind, DocumentId, SharedDocument, StreamStatus};
pub use error::ArtifactError;
pub use language::LanguageTag;
pub use metadata::{ArtifactMetadata, CodeMetadata, WebBuffer, WebMetadata};
pub use preview::Preview;
pub use store::{DocumentPayload, DocumentStore, InMemoryStore};
pub use stream::StreamEvent;
pub use version::{Direction, VersionHistory, VersionSnapshot};
pub use visibility::{LengthWindow, VisibilityPolicy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn streamed_python_artifact_lifecycle() {
        let mut doc = ArtifactDocument::new("squares", ArtifactKind::Code);
        let body = "import math\n\ndef squares(n):\n    return [i * i for i in range(n)]\n";

        for end in (1..=body.len()).step_by(7) {
            doc.apply_delta(&body[..end]);
        }
        doc.apply_delta(body);
        assert_eq!(doc.status(), StreamStatus::Streaming);

        doc.commit_version();
        assert_eq!(doc.status(), StreamStatus::Complete);
        assert_eq!(doc.language(), Some(LanguageTag::Python));
        assert_eq!(doc.history().len(), 1);
        assert_eq!(doc.history().latest().map(VersionSnapshot::content), Some(body));
    }

    #[test]
    fn run_records_land_in_code_console() {
        let mut doc = ArtifactDocument::new("hello", ArtifactKind::Code);
        doc.apply_delta("print('hi')");

        let record = RunRecord::in_progress(RunId::new());
        let id = record.id;
        doc.record_run(record);
        doc.record_run(RunRecord::completed(id, vec![OutputContent::text("hi")]));

        let outputs = doc.outputs().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs.get(id).unwrap().status, RunStatus::Completed);
    }
}
