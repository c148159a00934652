//! Shared interpreter session
//!
//! The session owns at most one live [`SandboxRuntime`]. It is created on the
//! first acquisition and reused afterwards; nothing is reset between runs, so
//! globals defined by one run are visible to the next. A runtime that reports
//! itself dead, or that failed fatally, is discarded and recreated on the next
//! acquisition.
//!
//! Runs take turns: [`InterpreterSession::take_turn`] hands out a FIFO guard
//! so output from overlapping runs never interleaves.

use crate::config::{InterpreterConfig, QuillConfig};
use crate::error::SandboxError;
use crate::python::PythonFactory;
use crate::runtime::{RuntimeFactory, SandboxRuntime};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

static GLOBAL: Lazy<Arc<InterpreterSession>> = Lazy::new(|| {
    let config = QuillConfig::default().with_env_overrides();
    Arc::new(InterpreterSession::python(config.interpreter))
});

/// Lazily created, reusable interpreter handle
#[derive(Debug)]
pub struct InterpreterSession {
    factory: Arc<dyn RuntimeFactory>,
    config: InterpreterConfig,
    runtime: Mutex<Option<Arc<dyn SandboxRuntime>>>,
    turn: Mutex<()>,
    creations: AtomicUsize,
}

/// Exclusive right to use the interpreter; released on drop
pub type Turn<'a> = MutexGuard<'a, ()>;

impl InterpreterSession {
    #[must_use]
    pub fn new(factory: Arc<dyn RuntimeFactory>, config: InterpreterConfig) -> Self {
        Self {
            factory,
            config,
            runtime: Mutex::new(None),
            turn: Mutex::new(()),
            creations: AtomicUsize::new(0),
        }
    }

    /// Session backed by a CPython child process
    #[must_use]
    pub fn python(config: InterpreterConfig) -> Self {
        Self::new(Arc::new(PythonFactory), config)
    }

    /// Process-wide default session
    #[must_use]
    pub fn global() -> Arc<InterpreterSession> {
        Arc::clone(&GLOBAL)
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Wait for exclusive use of the interpreter (first come, first served)
    pub async fn take_turn(&self) -> Turn<'_> {
        self.turn.lock().await
    }

    /// Get the live runtime, creating it if needed
    pub async fn acquire(&self) -> Result<Arc<dyn SandboxRuntime>, SandboxError> {
        let mut slot = self.runtime.lock().await;
        if let Some(runtime) = slot.as_ref() {
            if runtime.is_alive() {
                return Ok(Arc::clone(runtime));
            }
            tracing::warn!(runtime = %runtime.describe(), "interpreter session lost, restarting");
            *slot = None;
        }

        let runtime = self.factory.create(&self.config).await?;
        let count = self.creations.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(runtime = %runtime.describe(), creations = count, "interpreter session ready");
        *slot = Some(Arc::clone(&runtime));
        Ok(runtime)
    }

    /// Drop the current runtime; the next acquisition starts a fresh one
    pub async fn reset(&self) {
        if let Some(runtime) = self.runtime.lock().await.take() {
            tracing::debug!(runtime = %runtime.describe(), "interpreter session discarded");
        }
    }

    /// Whether a runtime is currently held
    pub async fn is_started(&self) -> bool {
        self.runtime.lock().await.is_some()
    }

    /// Number of runtimes created so far
    #[must_use]
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}
