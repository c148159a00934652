//! Error types for the execution layer
//!
//! [`SandboxError`] is raised by interpreter runtimes and never crosses the
//! engine's public boundary: the engine turns it into a `Failed` run record.
//! [`ConfigError`] covers loading `quill.toml`.

use std::path::PathBuf;

/// Interpreter runtime error
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Interpreter process could not be started
    #[error("failed to start interpreter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Interpreter did not complete its startup handshake
    #[error("interpreter handshake failed: {0}")]
    Handshake(String),

    /// Code raised inside the interpreter; the message is reported verbatim
    #[error("{0}")]
    Execution(String),

    /// Interpreter went away mid-request
    #[error("interpreter session closed unexpectedly")]
    SessionClosed,

    /// Malformed frame on the interpreter channel
    #[error("interpreter protocol error: {0}")]
    Protocol(String),

    /// Pipe I/O failed
    #[error("interpreter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request encoding failed
    #[error("request encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SandboxError {
    /// Whether the session that raised this error is unusable afterwards
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SandboxError::Execution(_) | SandboxError::Encode(_))
    }
}

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
