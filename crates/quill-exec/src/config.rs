//! Configuration
//!
//! `quill.toml` layout, every field optional:
//!
//! ```toml
//! [interpreter]
//! program = "python3"
//! args = []
//! working_dir = "/tmp/quill"
//! env = { PYTHONHASHSEED = "0" }
//!
//! [plotting]
//! max_pixels = 25000000
//! fallback_dpi = 100
//!
//! [visibility]
//! lower = 300
//! upper = 310
//!
//! [logging]
//! filter = "warn"
//! ```
//!
//! `QUILL_PYTHON` overrides `interpreter.program`.

use crate::error::ConfigError;
use quill_artifact::LengthWindow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the interpreter program
pub const PYTHON_ENV: &str = "QUILL_PYTHON";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub interpreter: InterpreterConfig,
    pub plotting: PlottingConfig,
    pub visibility: VisibilityConfig,
    pub logging: LoggingConfig,
}

impl QuillConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Apply `QUILL_PYTHON`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(program) = std::env::var(PYTHON_ENV) {
            if !program.trim().is_empty() {
                self.interpreter.program = program;
            }
        }
        self
    }

    /// With interpreter program
    #[inline]
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.interpreter.program = program.into();
        self
    }

    /// With plotting pixel budget
    #[inline]
    #[must_use]
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.plotting.max_pixels = max_pixels;
        self
    }

    /// With visibility window
    #[inline]
    #[must_use]
    pub fn with_visibility(mut self, lower: usize, upper: usize) -> Self {
        self.visibility = VisibilityConfig { lower, upper };
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interpreter.program.trim().is_empty() {
            return Err(ConfigError::Invalid("interpreter.program must not be empty".into()));
        }
        if self.visibility.lower >= self.visibility.upper {
            return Err(ConfigError::Invalid(format!(
                "visibility.lower ({}) must be below visibility.upper ({})",
                self.visibility.lower, self.visibility.upper
            )));
        }
        if self.plotting.fallback_dpi == 0 {
            return Err(ConfigError::Invalid("plotting.fallback_dpi must be positive".into()));
        }
        Ok(())
    }
}

/// Interpreter process settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub program: String,
    /// Extra arguments placed before the driver
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

/// Plot capture settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlottingConfig {
    /// Figures above this many pixels are re-rendered at `fallback_dpi`
    pub max_pixels: u64,
    pub fallback_dpi: u32,
}

impl Default for PlottingConfig {
    fn default() -> Self {
        Self {
            max_pixels: 25_000_000,
            fallback_dpi: 100,
        }
    }
}

/// Visibility window bounds (both exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub lower: usize,
    pub upper: usize,
}

impl VisibilityConfig {
    #[must_use]
    pub fn window(&self) -> LengthWindow {
        LengthWindow::new(self.lower, self.upper)
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            lower: LengthWindow::DEFAULT_LOWER,
            upper: LengthWindow::DEFAULT_UPPER,
        }
    }
}

/// Log filter used when `RUST_LOG` is unset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}
