//! Sandbox runtime boundary
//!
//! A [`SandboxRuntime`] is one live interpreter. Globals persist between calls
//! on the same runtime. Isolation is whatever the runtime provides; this crate
//! only sequences requests and captures output.

use crate::config::InterpreterConfig;
use crate::error::SandboxError;
use std::fmt::Debug;
use std::sync::Arc;

/// A live interpreter
#[async_trait::async_trait]
pub trait SandboxRuntime: Send + Sync + Debug {
    /// Short description for logs (implementation and version)
    fn describe(&self) -> String;

    /// Whether the runtime can still accept requests
    fn is_alive(&self) -> bool {
        true
    }

    /// Pre-load third-party packages named by the source's imports
    ///
    /// Every progress message is passed to `on_message`. Nothing is reported
    /// when all imports are already available.
    async fn load_packages_from_imports(
        &self,
        source: &str,
        on_message: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), SandboxError>;

    /// Execute source in the persistent namespace
    ///
    /// Each line written to stdout is passed to `on_stdout` without its
    /// trailing newline, in emission order.
    async fn run_source(
        &self,
        source: &str,
        on_stdout: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), SandboxError>;
}

/// Creates runtimes for an [`InterpreterSession`](crate::InterpreterSession)
#[async_trait::async_trait]
pub trait RuntimeFactory: Send + Sync + Debug {
    async fn create(&self, config: &InterpreterConfig) -> Result<Arc<dyn SandboxRuntime>, SandboxError>;
}
