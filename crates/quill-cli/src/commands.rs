//! Subcommand implementations
//!
//! Every command writes its report to a caller-supplied writer so the binary
//! and the tests share one code path.

use crate::cli::Invocation;
use anyhow::{bail, Context};
use base64::Engine as _;
use futures::stream;
use quill_artifact::{
    ArtifactDocument, ArtifactKind, DocumentPayload, DocumentStore, InMemoryStore, LanguageTable,
    LengthWindow, OutputContent, RunRecord, RunStatus, StreamEvent, StreamStatus, VisibilityPolicy, WebBuffer,
};
use quill_exec::{ExecutionEngine, QuillConfig};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Read a file, or stdin when `path` is `None`
pub fn read_source(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

fn title_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("artifact")
        .to_string()
}

/// Run one parsed invocation; `Ok(false)` means the command ran but failed
pub async fn dispatch(invocation: Invocation, config: &QuillConfig, out: &mut dyn Write) -> anyhow::Result<bool> {
    match invocation {
        Invocation::Classify { file, filename, scores } => {
            let content = read_source(file.as_deref())?;
            let hint = filename.as_deref().or_else(|| file.as_deref().and_then(file_name));
            classify(LanguageTable::builtin(), &content, hint, scores, out)?;
            Ok(true)
        }
        Invocation::Replay { file, kind, chunk, json } => {
            let content = read_source(Some(&file))?;
            let options = ReplayOptions {
                title: title_for(&file),
                kind,
                chunk,
                window: config.visibility.window(),
                json,
            };
            replay(&content, &options, out).await?;
            Ok(true)
        }
        Invocation::Run { file, images, json } => {
            let source = read_source(Some(&file))?;
            let engine = ExecutionEngine::from_config(config);
            let options = RunOptions {
                title: title_for(&file),
                filename: file_name(&file).map(str::to_owned),
                images,
                json,
            };
            let record = run(&engine, &source, &options, out).await?;
            Ok(record.status == RunStatus::Completed)
        }
        Invocation::Preview { files, kind, output } => {
            let mut inputs = Vec::with_capacity(files.len());
            for file in &files {
                inputs.push((file_name(file).map(str::to_owned), read_source(Some(file))?));
            }
            let title = files.first().map_or_else(|| "preview".to_string(), |f| title_for(f));
            preview(&title, kind, &inputs, output.as_deref(), out)?;
            Ok(true)
        }
    }
}

/// Print the detected language, optionally with per-language scores
pub fn classify(
    table: &LanguageTable,
    content: &str,
    filename: Option<&str>,
    scores: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let language = table.classify(filename, Some(content));
    tracing::debug!(%language, ?filename, "classified input");
    writeln!(out, "{language}")?;
    if scores {
        for (tag, score) in table.scores(content) {
            writeln!(out, "  {:<12}{score}", tag.as_str())?;
        }
    }
    Ok(())
}

/// Settings for [`replay`]
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub title: String,
    pub kind: ArtifactKind,
    /// Characters added per delta; zero is treated as one
    pub chunk: usize,
    pub window: LengthWindow,
    pub json: bool,
}

/// What a replayed stream did to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub steps: usize,
    /// 1-based delta that revealed the document
    pub revealed_at: Option<usize>,
    pub status: StreamStatus,
    pub versions: usize,
}

/// Length window that remembers which delta fired it
#[derive(Debug)]
struct RevealTracker {
    window: LengthWindow,
    consulted: AtomicUsize,
    fired_at: AtomicUsize,
}

impl RevealTracker {
    fn new(window: LengthWindow) -> Self {
        Self {
            window,
            consulted: AtomicUsize::new(0),
            fired_at: AtomicUsize::new(0),
        }
    }

    fn fired_at(&self) -> Option<usize> {
        match self.fired_at.load(Ordering::SeqCst) {
            0 => None,
            step => Some(step),
        }
    }
}

impl VisibilityPolicy for RevealTracker {
    fn should_become_visible(&self, prev_len: usize, new_len: usize, status: StreamStatus) -> bool {
        let step = self.consulted.fetch_add(1, Ordering::SeqCst) + 1;
        let fire = self.window.should_become_visible(prev_len, new_len, status);
        if fire {
            self.fired_at.store(step, Ordering::SeqCst);
        }
        fire
    }
}

/// Cumulative snapshots growing by `chunk` characters, ending with the full text
#[must_use]
pub fn cumulative_prefixes(content: &str, chunk: usize) -> Vec<String> {
    let chunk = chunk.max(1);
    let offsets: Vec<usize> = content
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(content.len()))
        .collect();
    let total = offsets.len() - 1;

    let mut prefixes: Vec<String> = (chunk..total)
        .step_by(chunk)
        .map(|chars| content[..offsets[chars]].to_string())
        .collect();
    if total > 0 {
        prefixes.push(content.to_string());
    }
    prefixes
}

fn status_label(status: StreamStatus) -> &'static str {
    match status {
        StreamStatus::Idle => "idle",
        StreamStatus::Streaming => "streaming",
        StreamStatus::Complete => "complete",
    }
}

/// Stream `content` into a fresh document and report the outcome
pub async fn replay(content: &str, options: &ReplayOptions, out: &mut dyn Write) -> anyhow::Result<ReplayReport> {
    let tracker = Arc::new(RevealTracker::new(options.window));
    let mut doc = ArtifactDocument::new(options.title.clone(), options.kind)
        .with_policy(Arc::clone(&tracker) as Arc<dyn VisibilityPolicy>);

    let prefixes = cumulative_prefixes(content, options.chunk);
    let steps = prefixes.len();
    let events = prefixes
        .into_iter()
        .map(StreamEvent::Delta)
        .chain(std::iter::once(StreamEvent::Finish));
    let status = doc.consume_stream(stream::iter(events)).await;

    let report = ReplayReport {
        steps,
        revealed_at: tracker.fired_at(),
        status,
        versions: doc.history().len(),
    };

    if options.json {
        let store = InMemoryStore::new();
        store.save(doc.id(), &doc.to_payload()).await?;
        let payload: DocumentPayload = store.load(doc.id()).await?;
        serde_json::to_writer_pretty(&mut *out, &payload)?;
        writeln!(out)?;
        return Ok(report);
    }

    writeln!(out, "steps: {}", report.steps)?;
    match report.revealed_at {
        Some(step) => writeln!(out, "revealed: step {step}")?,
        None => writeln!(out, "revealed: never")?,
    }
    writeln!(out, "status: {}", status_label(report.status))?;
    if let Some(language) = doc.language() {
        writeln!(out, "language: {language}")?;
    }
    writeln!(out, "versions: {}", report.versions)?;
    if let Some(web) = doc.metadata().as_web() {
        for which in [WebBuffer::Markup, WebBuffer::Style, WebBuffer::Script] {
            writeln!(out, "{}: {} chars", which.language(), web.buffer(which).chars().count())?;
        }
    }
    Ok(report)
}

/// Settings for [`run`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub title: String,
    pub filename: Option<String>,
    /// Directory receiving decoded PNG outputs
    pub images: Option<PathBuf>,
    pub json: bool,
}

fn save_image(dir: &Path, index: usize, data_uri: &str) -> anyhow::Result<PathBuf> {
    let Some((_, payload)) = data_uri.split_once(";base64,") else {
        bail!("image output is not a base64 data URI");
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("image output is not valid base64")?;
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("output-{index}.png"));
    std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Execute `source` as a code artifact and print its terminal record
pub async fn run(
    engine: &ExecutionEngine,
    source: &str,
    options: &RunOptions,
    out: &mut dyn Write,
) -> anyhow::Result<RunRecord> {
    let mut doc = ArtifactDocument::new(options.title.clone(), ArtifactKind::Code);
    if let Some(filename) = &options.filename {
        doc = doc.with_filename(filename.clone());
    }
    doc.apply_edit(source);
    let doc = doc.into_shared();

    let record = engine.run_document(&doc).await;

    if options.json {
        serde_json::to_writer_pretty(&mut *out, &record)?;
        writeln!(out)?;
        return Ok(record);
    }

    let mut images = 0usize;
    for content in &record.contents {
        match content {
            OutputContent::Text(text) => writeln!(out, "{text}")?,
            OutputContent::Image(uri) => {
                images += 1;
                match &options.images {
                    Some(dir) => {
                        let path = save_image(dir, images, uri)?;
                        writeln!(out, "[image saved to {}]", path.display())?;
                    }
                    None => writeln!(out, "[image {images}]")?,
                }
            }
        }
    }
    writeln!(out, "status: {}", record.status)?;
    Ok(record)
}

/// Render a preview page
///
/// Code and text artifacts take the first input; web artifacts stream every
/// input in so each lands in the buffer matching its language.
pub fn preview(
    title: &str,
    kind: ArtifactKind,
    inputs: &[(Option<String>, String)],
    output: Option<&Path>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut doc = ArtifactDocument::new(title, kind);
    match kind {
        ArtifactKind::Web => {
            for (name, content) in inputs {
                doc.apply_delta(content);
                tracing::debug!(?name, language = ?doc.language(), "web input applied");
            }
            doc.commit_version();
        }
        _ => {
            if let Some((name, content)) = inputs.first() {
                if let Some(name) = name {
                    doc = doc.with_filename(name.clone());
                }
                doc.apply_edit(content.clone());
            }
        }
    }

    let page = doc.preview()?;
    match output {
        Some(path) => {
            std::fs::write(path, page.as_html()).with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "preview written to {}", path.display())?;
        }
        None => out.write_all(page.as_html().as_bytes())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_end_with_full_text() {
        assert_eq!(cumulative_prefixes("abcdefg", 3), vec!["abc", "abcdef", "abcdefg"]);
        assert_eq!(cumulative_prefixes("abc", 3), vec!["abc"]);
        assert!(cumulative_prefixes("", 3).is_empty());
    }

    #[test]
    fn prefixes_respect_char_boundaries() {
        let prefixes = cumulative_prefixes("héllo wörld", 2);
        assert_eq!(prefixes[0], "hé");
        assert_eq!(prefixes.last().map(String::as_str), Some("héllo wörld"));
    }

    #[test]
    fn zero_chunk_is_one() {
        assert_eq!(cumulative_prefixes("ab", 0), vec!["a", "ab"]);
    }

    #[test]
    fn tracker_records_firing_delta() {
        let tracker = RevealTracker::new(LengthWindow::new(2, 5));
        assert!(!tracker.should_become_visible(0, 1, StreamStatus::Streaming));
        assert!(tracker.should_become_visible(1, 3, StreamStatus::Streaming));
        assert_eq!(tracker.fired_at(), Some(2));
    }

    #[test]
    fn malformed_image_is_rejected() {
        let dir = std::env::temp_dir();
        assert!(save_image(&dir, 1, "not a data uri").is_err());
    }
}
