//! Quill Execution
//!
//! Runs Python code artifacts in a shared, lazily started interpreter and
//! reports each run as a timeline of [`RunRecord`](quill_artifact::RunRecord)s.
//!
//! # Architecture
//!
//! ```text
//! ExecutionEngine ──▶ InterpreterSession ──▶ RuntimeFactory ──▶ SandboxRuntime
//!        │                (FIFO turns,          (PythonFactory)    (PythonProcessRuntime)
//!        │                 lazy init)
//!        ├──▶ CapabilityRegistry (setup snippets)
//!        └──▶ RunSink (ConsoleHandle, SharedDocument)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_exec::{ConsoleHandle, ExecutionEngine, QuillConfig};
//!
//! let engine = ExecutionEngine::from_config(&QuillConfig::load(None)?);
//! let console = ConsoleHandle::new();
//! let record = engine.run("print('hello')", &console).await;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod python;
pub mod runtime;
pub mod session;
pub mod sink;

pub use capability::{Capability, CapabilityRegistry, Detector};
pub use config::{InterpreterConfig, LoggingConfig, PlottingConfig, QuillConfig, VisibilityConfig};
pub use engine::{unsupported_language_message, ExecutionEngine};
pub use error::{ConfigError, SandboxError};
pub use python::{PythonFactory, PythonProcessRuntime};
pub use runtime::{RuntimeFactory, SandboxRuntime};
pub use session::{InterpreterSession, Turn};
pub use sink::{ConsoleHandle, RunSink};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
