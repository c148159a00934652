//! Python process runtime
//!
//! Runs a long-lived CPython child driven over a JSON-lines channel. The
//! driver script keeps one persistent `__main__` namespace, captures
//! `sys.stdout` line by line and reports exceptions as formatted tracebacks.
//! Interpreter stderr (including fd-level writes to stdout) is forwarded to
//! `tracing::debug!`.
//!
//! Requests (stdin):
//! - `{"op":"exec","code":"..."}`
//! - `{"op":"load","code":"..."}`
//!
//! Events (stdout):
//! - `{"event":"ready","version":"3.12.1"}` once at startup
//! - `{"event":"stdout","data":"..."}`
//! - `{"event":"progress","message":"..."}`
//! - `{"event":"done"}` or `{"event":"error","message":"..."}` closing a request

use crate::config::InterpreterConfig;
use crate::error::SandboxError;
use crate::runtime::{RuntimeFactory, SandboxRuntime};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

const DRIVER: &str = include_str!("driver.py");

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Exec { code: &'a str },
    Load { code: &'a str },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event {
    Ready { version: String },
    Stdout { data: String },
    Progress { message: String },
    Done,
    Error { message: String },
}

#[derive(Debug)]
struct Channel {
    // Held so the child is killed when the runtime is dropped
    _child: Child,
    stdin: ChildStdin,
    events: Lines<BufReader<ChildStdout>>,
}

/// CPython child process
#[derive(Debug)]
pub struct PythonProcessRuntime {
    program: String,
    version: String,
    channel: Mutex<Channel>,
    alive: AtomicBool,
}

impl PythonProcessRuntime {
    /// Spawn the interpreter and wait for its handshake
    pub async fn spawn(config: &InterpreterConfig) -> Result<Self, SandboxError> {
        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .arg("-u")
            .arg("-c")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("PYTHONIOENCODING", "utf-8")
            .env("MPLBACKEND", "Agg")
            .envs(&config.env)
            .kill_on_drop(true);
        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| SandboxError::Spawn {
            program: config.program.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SandboxError::Handshake("stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SandboxError::Handshake("stdout not captured".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "quill::interpreter", "{line}");
                }
            });
        }

        let mut events = BufReader::new(stdout).lines();
        let version = match events.next_line().await? {
            Some(line) => match serde_json::from_str::<Event>(&line) {
                Ok(Event::Ready { version }) => version,
                Ok(other) => return Err(SandboxError::Handshake(format!("expected ready, got {other:?}"))),
                Err(e) => return Err(SandboxError::Handshake(format!("{e}: {line}"))),
            },
            None => {
                let status = child.wait().await?;
                return Err(SandboxError::Handshake(format!("interpreter exited with {status}")));
            }
        };

        tracing::info!(program = %config.program, %version, "python interpreter started");
        Ok(Self {
            program: config.program.clone(),
            version,
            channel: Mutex::new(Channel {
                _child: child,
                stdin,
                events,
            }),
            alive: AtomicBool::new(true),
        })
    }

    /// Interpreter version reported at startup
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    async fn exchange(
        &self,
        request: &Request<'_>,
        on_stdout: &mut (dyn FnMut(String) + Send),
        on_progress: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), SandboxError> {
        let mut channel = self.channel.lock().await;
        // Not alive until the closing frame is read; a request dropped mid-flight
        // leaves unread frames behind and the runtime must not be reused.
        self.alive.store(false, Ordering::SeqCst);
        let result = Self::round_trip(&mut channel, request, on_stdout, on_progress).await;
        let usable = match &result {
            Ok(()) => true,
            Err(err) => !err.is_fatal(),
        };
        self.alive.store(usable, Ordering::SeqCst);
        result
    }

    async fn round_trip(
        channel: &mut Channel,
        request: &Request<'_>,
        on_stdout: &mut (dyn FnMut(String) + Send),
        on_progress: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), SandboxError> {
        let mut frame = serde_json::to_string(request)?;
        frame.push('\n');
        channel.stdin.write_all(frame.as_bytes()).await?;
        channel.stdin.flush().await?;

        loop {
            let Some(line) = channel.events.next_line().await? else {
                return Err(SandboxError::SessionClosed);
            };
            let event: Event =
                serde_json::from_str(&line).map_err(|e| SandboxError::Protocol(format!("{e}: {line}")))?;
            match event {
                Event::Stdout { data } => on_stdout(data),
                Event::Progress { message } => on_progress(message),
                Event::Done => return Ok(()),
                Event::Error { message } => return Err(SandboxError::Execution(message)),
                Event::Ready { .. } => return Err(SandboxError::Protocol("unexpected ready".into())),
            }
        }
    }
}

#[async_trait::async_trait]
impl SandboxRuntime for PythonProcessRuntime {
    fn describe(&self) -> String {
        format!("{} (Python {})", self.program, self.version)
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn load_packages_from_imports(
        &self,
        source: &str,
        on_message: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), SandboxError> {
        let mut on_stdout = |line: String| tracing::debug!(target: "quill::interpreter", "import output: {line}");
        self.exchange(&Request::Load { code: source }, &mut on_stdout, on_message)
            .await
    }

    async fn run_source(
        &self,
        source: &str,
        on_stdout: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), SandboxError> {
        let mut on_progress = |message: String| tracing::debug!(%message, "interpreter progress");
        self.exchange(&Request::Exec { code: source }, on_stdout, &mut on_progress)
            .await
    }
}

/// Factory spawning [`PythonProcessRuntime`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonFactory;

#[async_trait::async_trait]
impl RuntimeFactory for PythonFactory {
    async fn create(&self, config: &InterpreterConfig) -> Result<Arc<dyn SandboxRuntime>, SandboxError> {
        let runtime = PythonProcessRuntime::spawn(config).await?;
        Ok(Arc::new(runtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_tagged_by_op() {
        let json = serde_json::to_string(&Request::Exec { code: "print(1)" }).unwrap();
        assert_eq!(json, r#"{"op":"exec","code":"print(1)"}"#);
        let json = serde_json::to_string(&Request::Load { code: "" }).unwrap();
        assert_eq!(json, r#"{"op":"load","code":""}"#);
    }

    #[test]
    fn events_parse_regardless_of_field_order() {
        let event: Event = serde_json::from_str(r#"{"data": "a", "event": "stdout"}"#).unwrap();
        assert!(matches!(event, Event::Stdout { data } if data == "a"));
        let event: Event = serde_json::from_str(r#"{"event": "done"}"#).unwrap();
        assert!(matches!(event, Event::Done));
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let config = InterpreterConfig {
            program: "quill-no-such-python".into(),
            ..InterpreterConfig::default()
        };
        let err = PythonProcessRuntime::spawn(&config).await.unwrap_err();
        assert!(matches!(err, SandboxError::Spawn { .. }));
    }
}
