//! Run record sinks
//!
//! The engine publishes every state of a run as a whole [`RunRecord`]. A sink
//! applies it under its own lock, so observers only ever see complete records.

use parking_lot::Mutex;
use quill_artifact::{RunConsole, RunId, RunRecord, SharedDocument};
use std::sync::Arc;
use tokio::sync::broadcast;

const UPDATE_CAPACITY: usize = 256;

/// Receiver of run record updates
pub trait RunSink: Send + Sync {
    fn publish(&self, record: &RunRecord);
}

impl RunSink for SharedDocument {
    fn publish(&self, record: &RunRecord) {
        self.write().record_run(record.clone());
    }
}

/// Standalone console with change notifications
#[derive(Debug, Clone)]
pub struct ConsoleHandle {
    console: Arc<Mutex<RunConsole>>,
    updates: broadcast::Sender<RunRecord>,
}

impl ConsoleHandle {
    #[must_use]
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            console: Arc::new(Mutex::new(RunConsole::new())),
            updates,
        }
    }

    /// Stream of accepted records, in publication order
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RunRecord> {
        self.updates.subscribe()
    }

    /// Copy of the current console
    #[must_use]
    pub fn snapshot(&self) -> RunConsole {
        self.console.lock().clone()
    }

    #[must_use]
    pub fn get(&self, id: RunId) -> Option<RunRecord> {
        self.console.lock().get(id).cloned()
    }

    pub fn clear(&self) {
        self.console.lock().clear();
    }
}

impl Default for ConsoleHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSink for ConsoleHandle {
    fn publish(&self, record: &RunRecord) {
        let accepted = self.console.lock().upsert(record.clone());
        if accepted {
            // No subscribers is fine
            let _ = self.updates.send(record.clone());
        }
    }
}
