//! Execution orchestration: Resolve → Capture → Persist → Sync → Exit.
//!
//! The wrapped command's exit code is decided at the capture step and is
//! what the process ultimately exits with. Everything after capture is
//! best-effort: a record that cannot be written skips synchronization, a
//! synchronization failure is reported, and neither touches the exit code.

use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::Local;

use crate::capture::{PtyRunner, REENTRANCY_MARKER};
use crate::git::RepositoryClient;
use crate::{project, record, sync};

/// Capture `command` and return the exit code to propagate to the shell.
///
/// # Errors
/// Resolver and capture failures abort the invocation; persistence and
/// synchronization failures do not (the command already ran).
pub fn run(
    runner: &impl PtyRunner,
    repo: &impl RepositoryClient,
    command: &[String],
) -> Result<i32> {
    let cwd = std::env::current_dir().context("determine working directory")?;
    run_in(runner, repo, command, &cwd)
}

pub fn run_in(
    runner: &impl PtyRunner,
    repo: &impl RepositoryClient,
    command: &[String],
    cwd: &Path,
) -> Result<i32> {
    anyhow::ensure!(!command.is_empty(), "no command given");

    // Nested captures are allowed; the marker exists so the inner session
    // (and anything it spawns) can tell.
    if std::env::var(REENTRANCY_MARKER).is_ok() {
        eprintln!("[runlog] already inside a capture; recording a nested session");
    }

    let identity = project::resolve(repo, cwd)?;
    let timestamp = Local::now();
    let git_revision = repo.head_revision(cwd)?;

    let transcript = tempfile::Builder::new()
        .prefix("runlog")
        .tempfile()
        .context("create transcript scratch file")?
        .into_temp_path();

    let exit_code = runner.run(command, &transcript)?;

    let log_record = record::LogRecord {
        command: command.to_vec(),
        user: record::current_user(),
        repo_path: identity.repo_path.clone(),
        project_path: identity.project_path.clone(),
        git_revision,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        exit_code,
        timestamp,
    };

    match record::write(&log_record, &identity.project_logs_dir, &transcript) {
        Ok(path) => {
            // Scratch transcript is gone once the record holds the bytes.
            drop(transcript);
            let message = sync::headline(command, exit_code);
            if let Err(e) = sync::sync_record(repo, &identity, &path, &message) {
                eprintln!("[runlog] sync error: {e:#}");
            }
        }
        Err(e) => {
            eprintln!("[runlog] error: {e:#}");
        }
    }

    Ok(exit_code)
}
