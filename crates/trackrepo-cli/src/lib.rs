pub mod cli;
pub mod diagnostics;
pub mod dispatch;

use anyhow::Result;
use clap::Parser;
use trackrepo_app::{App, AppPaths};

use crate::cli::Cli;
use crate::diagnostics::{DiagnosticsSession, LogSink};

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let sink = if cli.command.is_none() {
        LogSink::Discard
    } else {
        LogSink::Stderr
    };
    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics, sink)?;
    if let Some(path) = diagnostics.path() {
        eprintln!("Diagnostics enabled: {}", path.display());
    }

    let result = AppPaths::resolve()
        .and_then(|paths| App::from_paths(&paths))
        .and_then(|app| dispatch::run_with_deps(cli, &app));
    if let Err(error) = &result {
        diagnostics.record_failure(error);
    }
    result
}
