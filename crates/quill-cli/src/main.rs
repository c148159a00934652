//! `quill` command line entry point

use quill_cli::{build_cli, commands, logging, Invocation};
use quill_exec::QuillConfig;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = build_cli().get_matches();
    let (globals, invocation) = Invocation::from_matches(&matches)?;

    let config = QuillConfig::load(globals.config.as_deref())?;
    logging::init(globals.verbose, &config.logging.filter);
    tracing::debug!(?config, "configuration loaded");

    let mut stdout = std::io::stdout().lock();
    let succeeded = commands::dispatch(invocation, &config, &mut stdout).await?;

    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
