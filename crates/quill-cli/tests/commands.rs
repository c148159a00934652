//! Functional tests for the `quill` subcommands.
//!
//! Core guarantees exercised here:
//! - Classification honours the filename hint before content.
//! - A replayed stream reveals the document on the delta inside the window
//!   and commits exactly one version.
//! - Runs print their output in order and report failures as such.
//! - Previews compose every web buffer into one page.

use pretty_assertions::assert_eq;
use quill_artifact::{ArtifactKind, LanguageTable, LengthWindow, RunStatus, StreamStatus};
use quill_cli::commands::{self, ReplayOptions, RunOptions};
use quill_cli::Invocation;
use quill_exec::QuillConfig;
use quill_test_utils::{scripted_engine, ScriptedFactory, C_PROGRAM, PLOT_SCRIPT, TWO_PRINTS};
use std::sync::Arc;

fn output(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).unwrap()
}

fn replay_options(kind: ArtifactKind, chunk: usize) -> ReplayOptions {
    ReplayOptions {
        title: "replay".into(),
        kind,
        chunk,
        window: LengthWindow::default(),
        json: false,
    }
}

/// Tenet: the filename hint decides before any signature is scored.
#[test]
fn classify_prefers_filename() {
    let mut out = Vec::new();
    commands::classify(LanguageTable::builtin(), C_PROGRAM, Some("main.py"), false, &mut out).unwrap();
    assert_eq!(output(out), "python\n");

    let mut out = Vec::new();
    commands::classify(LanguageTable::builtin(), C_PROGRAM, None, true, &mut out).unwrap();
    let text = output(out);
    assert!(text.starts_with("c\n"));
    assert_eq!(text.lines().count(), 12);
}

/// Tenet: a steady stream is revealed once it lands inside (300, 310).
#[tokio::test]
async fn replay_reports_reveal_step() {
    let content = "x".repeat(320);
    let mut out = Vec::new();

    let report = commands::replay(&content, &replay_options(ArtifactKind::Text, 5), &mut out)
        .await
        .unwrap();

    assert_eq!(report.steps, 64);
    assert_eq!(report.revealed_at, Some(61));
    assert_eq!(report.status, StreamStatus::Complete);
    assert_eq!(report.versions, 1);
    assert!(output(out).contains("revealed: step 61\n"));
}

/// Tenet: a short artifact never reaches the window.
#[tokio::test]
async fn replay_of_short_code_stays_hidden() {
    let mut out = Vec::new();
    let report = commands::replay(TWO_PRINTS, &replay_options(ArtifactKind::Code, 4), &mut out)
        .await
        .unwrap();

    assert_eq!(report.revealed_at, None);
    let text = output(out);
    assert!(text.contains("revealed: never\n"));
    assert!(text.contains("language: python\n"));
}

/// Tenet: the JSON form is the payload a store would persist.
#[tokio::test]
async fn replay_json_prints_payload() {
    let mut options = replay_options(ArtifactKind::Code, 8);
    options.json = true;
    let mut out = Vec::new();

    commands::replay(TWO_PRINTS, &options, &mut out).await.unwrap();

    let payload: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(payload["kind"], "code");
    assert_eq!(payload["content"], TWO_PRINTS);
    assert_eq!(payload["metadata"]["language"], "python");
}

/// Tenet: output is printed in emission order, then the terminal status.
#[tokio::test]
async fn run_prints_outputs_in_order() {
    let factory = Arc::new(ScriptedFactory::new());
    let engine = scripted_engine(&factory);
    let mut out = Vec::new();

    let record = commands::run(&engine, TWO_PRINTS, &RunOptions::default(), &mut out)
        .await
        .unwrap();

    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(output(out), "first\nsecond\nstatus: completed\n");
}

/// Tenet: image outputs are decoded into PNG files.
#[tokio::test]
async fn run_saves_images() {
    let factory = Arc::new(ScriptedFactory::new());
    let engine = scripted_engine(&factory);
    let dir = tempfile::tempdir().unwrap();
    let options = RunOptions {
        images: Some(dir.path().to_path_buf()),
        ..RunOptions::default()
    };
    let mut out = Vec::new();

    commands::run(&engine, PLOT_SCRIPT, &options, &mut out).await.unwrap();

    let png = std::fs::read(dir.path().join("output-1.png")).unwrap();
    assert_eq!(&png[1..4], b"PNG");
    assert!(output(out).contains("[image saved to"));
}

/// Tenet: non-python input fails without starting an interpreter.
#[tokio::test]
async fn run_of_c_source_fails() {
    let factory = Arc::new(ScriptedFactory::new());
    let engine = scripted_engine(&factory);
    let mut options = RunOptions::default();
    options.json = true;
    let mut out = Vec::new();

    let record = commands::run(&engine, C_PROGRAM, &options, &mut out).await.unwrap();

    assert_eq!(record.status, RunStatus::Failed);
    assert_eq!(factory.creations(), 0);
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["status"], "failed");
}

/// Tenet: web inputs each fill their own buffer in the composed page.
#[test]
fn web_preview_composes_buffers() {
    let inputs = vec![
        (
            Some("index.html".to_string()),
            "<!DOCTYPE html>\n<html><body><div class=\"card\">Hi</div></body></html>".to_string(),
        ),
        (
            Some("site.css".to_string()),
            ".card {\n  padding: 8px;\n  color: navy;\n}\n@media print { .card { display: none; } }".to_string(),
        ),
    ];
    let mut out = Vec::new();

    commands::preview("site", ArtifactKind::Web, &inputs, None, &mut out).unwrap();

    let page = output(out);
    assert!(page.contains("<div class=\"card\">Hi</div>"));
    assert!(page.contains("padding: 8px;"));
    assert!(page.contains("<style>"));
}

/// Tenet: markdown code artifacts preview as rendered HTML; python does not preview.
#[test]
fn code_preview_depends_on_language() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("notes.html");
    let markdown = vec![(None, "# Notes\n\n- **bold** item\n- [link](http://example.com)\n".to_string())];
    let mut out = Vec::new();

    commands::preview("notes", ArtifactKind::Code, &markdown, Some(&target), &mut out).unwrap();

    let page = std::fs::read_to_string(&target).unwrap();
    assert!(page.contains("<h1>Notes</h1>"));
    assert!(page.contains("<strong>bold</strong>"));

    let python = vec![(None, TWO_PRINTS.to_string())];
    let err = commands::preview("script", ArtifactKind::Code, &python, None, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("python"));
}

/// Tenet: dispatch reads files and routes to the matching command.
#[tokio::test]
async fn dispatch_classifies_file_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.css");
    std::fs::write(&path, "import os\n").unwrap();

    let (_, invocation) = Invocation::parse_from(["quill", "classify", path.to_str().unwrap()]).unwrap();
    let mut out = Vec::new();
    let ok = commands::dispatch(invocation, &QuillConfig::default(), &mut out).await.unwrap();

    assert!(ok);
    assert_eq!(output(out), "css\n");
}

/// Tenet: a missing input file is an error, not a panic.
#[tokio::test]
async fn dispatch_reports_missing_file() {
    let (_, invocation) = Invocation::parse_from(["quill", "replay", "/nonexistent/quill/input.py"]).unwrap();
    let err = commands::dispatch(invocation, &QuillConfig::default(), &mut Vec::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}
