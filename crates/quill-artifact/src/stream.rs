//! Inbound streaming protocol
//!
//! The generation pipeline emits cumulative snapshots followed by a finish
//! marker. Each [`StreamEvent::Delta`] carries the whole content so far.

use crate::document::{ArtifactDocument, StreamStatus};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

/// One event of the generation stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Cumulative content so far
    Delta(String),
    /// Generation finished
    Finish,
}

impl ArtifactDocument {
    /// Drive the document from a stream of events
    ///
    /// Deltas are applied in order; `Finish` commits a version and stops
    /// consumption. A stream that ends without `Finish` leaves the document
    /// streaming.
    pub async fn consume_stream<S>(&mut self, events: S) -> StreamStatus
    where
        S: Stream<Item = StreamEvent>,
    {
        futures::pin_mut!(events);
        let mut applied = 0usize;
        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Delta(content) => {
                    self.apply_delta(&content);
                    applied += 1;
                }
                StreamEvent::Finish => {
                    self.commit_version();
                    break;
                }
            }
        }
        tracing::debug!(doc = %self.id(), applied, status = ?self.status(), "stream consumed");
        self.status()
    }
}
