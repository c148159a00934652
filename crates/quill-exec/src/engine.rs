//! Execution engine
//!
//! Runs one submitted program per call and reports its timeline through a
//! [`RunSink`]:
//!
//! ```text
//! non-python source ─────────────────────────────────────────▶ Failed
//! python source ─▶ InProgress ─▶ LoadingPackages* ─▶ Completed | Failed
//! ```
//!
//! Output chunks are accumulated privately and published once, with the
//! terminal record. Any interpreter error ends the run as `Failed` with the
//! error text as the only content; partial output is discarded.

use crate::capability::CapabilityRegistry;
use crate::config::QuillConfig;
use crate::error::SandboxError;
use crate::session::InterpreterSession;
use crate::sink::RunSink;
use quill_artifact::{LanguageTable, LanguageTag, OutputContent, RunId, RunRecord, SharedDocument};
use std::sync::Arc;

/// Message for sources that cannot be executed
#[must_use]
pub fn unsupported_language_message(language: LanguageTag) -> String {
    format!(
        "Code execution is only available for Python. This appears to be {language} code. \
         You can view and edit the code, but execution is not supported."
    )
}

/// Sequenced, capability-aware runner over a shared interpreter session
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    session: Arc<InterpreterSession>,
    capabilities: CapabilityRegistry,
    table: Arc<LanguageTable>,
}

impl ExecutionEngine {
    /// Engine over `session` with the built-in capabilities
    #[must_use]
    pub fn new(session: Arc<InterpreterSession>) -> Self {
        Self {
            session,
            capabilities: CapabilityRegistry::builtin(&crate::config::PlottingConfig::default()),
            table: LanguageTable::shared_builtin(),
        }
    }

    /// Engine with its own Python session built from configuration
    #[must_use]
    pub fn from_config(config: &QuillConfig) -> Self {
        let session = Arc::new(InterpreterSession::python(config.interpreter.clone()));
        Self::new(session).with_capabilities(CapabilityRegistry::builtin(&config.plotting))
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: CapabilityRegistry) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: Arc<LanguageTable>) -> Self {
        self.table = table;
        self
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> &Arc<InterpreterSession> {
        &self.session
    }

    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Run `source` under a fresh run id
    pub async fn run(&self, source: &str, sink: &dyn RunSink) -> RunRecord {
        self.run_with_id(RunId::new(), source, sink).await
    }

    /// Run the current content of a shared document into its console
    pub async fn run_document(&self, doc: &SharedDocument) -> RunRecord {
        let source = doc.content();
        self.run(&source, doc).await
    }

    /// Run `source` under a caller-chosen id
    ///
    /// Never fails: every error is reported as the terminal record, which is
    /// also returned.
    #[tracing::instrument(skip_all, fields(run = %id))]
    pub async fn run_with_id(&self, id: RunId, source: &str, sink: &dyn RunSink) -> RunRecord {
        let language = self.table.classify(None, Some(source));
        if language != LanguageTag::Python {
            tracing::info!(%language, "refusing to execute non-python source");
            let record = RunRecord::failed(id, unsupported_language_message(language));
            sink.publish(&record);
            return record;
        }

        sink.publish(&RunRecord::in_progress(id));
        tracing::info!("run queued");

        let record = match self.execute(id, source, sink).await {
            Ok(contents) => {
                tracing::info!(chunks = contents.len(), "run completed");
                RunRecord::completed(id, contents)
            }
            Err(err) => {
                tracing::error!(error = %err, "run failed");
                RunRecord::failed(id, err.to_string())
            }
        };
        sink.publish(&record);
        record
    }

    /// Take the interpreter turn for the whole run
    ///
    /// A fatal error discards the session before the turn is released, so the
    /// next queued run starts on a fresh interpreter.
    async fn execute(&self, id: RunId, source: &str, sink: &dyn RunSink) -> Result<Vec<OutputContent>, SandboxError> {
        let _turn = self.session.take_turn().await;
        let result = self.execute_turn(id, source, sink).await;
        if let Err(err) = &result {
            if err.is_fatal() {
                self.session.reset().await;
            }
        }
        result
    }

    async fn execute_turn(
        &self,
        id: RunId,
        source: &str,
        sink: &dyn RunSink,
    ) -> Result<Vec<OutputContent>, SandboxError> {
        let runtime = self.session.acquire().await?;

        let mut on_message = |message: String| {
            tracing::debug!(%message, "loading packages");
            sink.publish(&RunRecord::loading_packages(id, message));
        };
        runtime.load_packages_from_imports(source, &mut on_message).await?;

        let mut contents = Vec::new();
        let mut collect = |chunk: String| contents.push(OutputContent::classify(chunk));

        for capability in self.capabilities.detect(source) {
            tracing::debug!(capability = capability.name(), "applying capability setup");
            for program in capability.programs() {
                runtime.run_source(program, &mut collect).await?;
            }
        }
        runtime.run_source(source, &mut collect).await?;

        Ok(contents)
    }
}
