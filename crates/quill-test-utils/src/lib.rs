//! Testing utilities for the quill workspace
//!
//! Shared fixtures plus a scripted interpreter that stands in for CPython.
//!
//! [`ScriptedRuntime`] understands a tiny subset of Python, one top-level
//! statement per line (indented lines are ignored):
//! - `print('text')` / `print("text")` / `print(expr)` emits one stdout line
//! - `plt.show()` emits [`PIXEL_PNG`]
//! - `raise ...` fails with the rest of the line as the error message
//! - `__crash__()` kills the runtime
//! - `import x` / `from x import y` are honoured by the package loader

#![allow(missing_docs)]

use parking_lot::Mutex;
use quill_artifact::{RunRecord, RunStatus};
use quill_exec::{
    ExecutionEngine, InterpreterConfig, InterpreterSession, RunSink, RuntimeFactory, SandboxError, SandboxRuntime,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A valid 1x1 PNG as a data URI
pub const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const TWO_PRINTS: &str = "print('first')\nprint('second')\n";

pub const PLOT_SCRIPT: &str = "import matplotlib.pyplot as plt\nplt.plot([1, 2, 3])\nplt.show()\n";

pub const NUMPY_SCRIPT: &str = "import numpy as np\nprint('ready')\n";

pub const C_PROGRAM: &str = "#include <stdio.h>\nint main(void) {\n    printf(\"hi\\n\");\n    return 0;\n}\n";

pub const FAILING_SCRIPT: &str = "import os\nprint('before')\nraise ValueError('bad input')\nprint('after')\n";

/// Behaviour shared by every runtime a [`ScriptedFactory`] creates
#[derive(Debug, Clone)]
pub struct Script {
    /// Packages the loader can find
    pub installed: Vec<String>,
    /// Packages found but failing to import
    pub broken: Vec<String>,
    /// Pause before each `run_source`
    pub delay: Option<Duration>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            installed: vec!["numpy".into(), "matplotlib".into(), "pandas".into()],
            broken: Vec::new(),
            delay: None,
        }
    }
}

/// Fake interpreter following a [`Script`]
#[derive(Debug)]
pub struct ScriptedRuntime {
    generation: usize,
    script: Script,
    executed: Arc<Mutex<Vec<String>>>,
    loaded: Mutex<HashSet<String>>,
    alive: AtomicBool,
}

impl ScriptedRuntime {
    /// Simulate the interpreter process dying
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    fn ensure_alive(&self) -> Result<(), SandboxError> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SandboxError::SessionClosed)
        }
    }
}

fn import_roots(source: &str) -> Vec<String> {
    let mut roots = Vec::new();
    for line in source.lines() {
        let module = if let Some(rest) = line.strip_prefix("import ") {
            rest.split([' ', ',']).next()
        } else if let Some(rest) = line.strip_prefix("from ") {
            rest.split(' ').next()
        } else {
            None
        };
        if let Some(root) = module.and_then(|m| m.split('.').next()) {
            if !root.is_empty() && !roots.iter().any(|r| r == root) {
                roots.push(root.to_string());
            }
        }
    }
    roots
}

fn print_argument(line: &str) -> Option<String> {
    let inner = line.strip_prefix("print(")?.strip_suffix(')')?;
    let unquoted = inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(inner);
    Some(unquoted.to_string())
}

#[async_trait::async_trait]
impl SandboxRuntime for ScriptedRuntime {
    fn describe(&self) -> String {
        format!("scripted runtime #{}", self.generation)
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn load_packages_from_imports(
        &self,
        source: &str,
        on_message: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), SandboxError> {
        self.ensure_alive()?;
        let pending: Vec<String> = {
            let loaded = self.loaded.lock();
            import_roots(source)
                .into_iter()
                .filter(|root| self.script.installed.contains(root) || self.script.broken.contains(root))
                .filter(|root| !loaded.contains(root))
                .collect()
        };
        if pending.is_empty() {
            return Ok(());
        }

        on_message(format!("Loading {}", pending.join(", ")));
        if let Some(broken) = pending.iter().find(|p| self.script.broken.contains(p)) {
            return Err(SandboxError::Execution(format!(
                "Failed to load {broken}: ImportError: cannot import name '{broken}'"
            )));
        }
        self.loaded.lock().extend(pending.iter().cloned());
        on_message(format!("Loaded {}", pending.join(", ")));
        Ok(())
    }

    async fn run_source(
        &self,
        source: &str,
        on_stdout: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), SandboxError> {
        self.ensure_alive()?;
        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
        self.executed.lock().push(source.to_string());

        for line in source.lines() {
            if line.starts_with(char::is_whitespace) {
                continue;
            }
            let line = line.trim_end();
            if let Some(text) = print_argument(line) {
                on_stdout(text);
            } else if line == "plt.show()" {
                on_stdout(PIXEL_PNG.to_string());
            } else if let Some(message) = line.strip_prefix("raise ") {
                return Err(SandboxError::Execution(message.to_string()));
            } else if line == "__crash__()" {
                self.kill();
                return Err(SandboxError::SessionClosed);
            }
        }
        Ok(())
    }
}

/// Factory producing [`ScriptedRuntime`]s and recording what they ran
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    script: Script,
    creations: AtomicUsize,
    refuse: AtomicBool,
    executed: Arc<Mutex<Vec<String>>>,
    runtimes: Mutex<Vec<Arc<ScriptedRuntime>>>,
}

impl ScriptedFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_script(script: Script) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Make subsequent `create` calls fail (or succeed again)
    pub fn refuse_creation(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of runtimes successfully created
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Every program executed by any runtime, in order
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    /// Most recently created runtime
    pub fn latest(&self) -> Option<Arc<ScriptedRuntime>> {
        self.runtimes.lock().last().cloned()
    }
}

#[async_trait::async_trait]
impl RuntimeFactory for ScriptedFactory {
    async fn create(&self, _config: &InterpreterConfig) -> Result<Arc<dyn SandboxRuntime>, SandboxError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SandboxError::Handshake("scripted factory refused to start".into()));
        }
        let generation = self.creations.fetch_add(1, Ordering::SeqCst) + 1;
        let runtime = Arc::new(ScriptedRuntime {
            generation,
            script: self.script.clone(),
            executed: Arc::clone(&self.executed),
            loaded: Mutex::new(HashSet::new()),
            alive: AtomicBool::new(true),
        });
        self.runtimes.lock().push(Arc::clone(&runtime));
        Ok(runtime)
    }
}

/// Session over a scripted factory
pub fn scripted_session(factory: &Arc<ScriptedFactory>) -> Arc<InterpreterSession> {
    let factory: Arc<dyn RuntimeFactory> = Arc::clone(factory) as Arc<dyn RuntimeFactory>;
    Arc::new(InterpreterSession::new(factory, InterpreterConfig::default()))
}

/// Engine with built-in capabilities over a scripted factory
pub fn scripted_engine(factory: &Arc<ScriptedFactory>) -> ExecutionEngine {
    ExecutionEngine::new(scripted_session(factory))
}

/// Sink remembering every published record
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<RunRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RunRecord> {
        self.records.lock().clone()
    }

    pub fn statuses(&self) -> Vec<RunStatus> {
        self.records.lock().iter().map(|r| r.status).collect()
    }
}

impl RunSink for RecordingSink {
    fn publish(&self, record: &RunRecord) {
        self.records.lock().push(record.clone());
    }
}
