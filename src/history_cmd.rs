use std::path::Path;

use anyhow::Context as _;
use dialoguer::Confirm;

use runlog::git::Git;
use runlog::project::{self, ProjectIdentity};
use runlog::sync;

/// Pretty format for the history listing: `shortHash [date] (author) summary`.
const LOG_FORMAT: &str = "%h [%ad] (%an) %s";

fn current_identity() -> anyhow::Result<ProjectIdentity> {
    let cwd = std::env::current_dir().context("determine working directory")?;
    Ok(project::resolve(&Git, &cwd)?)
}

pub fn run(args: &[String]) -> anyhow::Result<i32> {
    let identity = current_identity()?;
    match args.first().map(String::as_str) {
        Some("show") => cmd_show(&identity, &args[1..]),
        Some("pull") => cmd_pull(&identity),
        Some("fix") => cmd_fix(&identity),
        Some("git") => Git::passthrough(&identity.project_logs_dir, &args[1..], &[]),
        _ => cmd_list(&identity, args),
    }
}

/// List prior log entries via `git log` in the store working tree. Extra
/// args pass straight through (`-n 5`, `--since=...`).
fn cmd_list(identity: &ProjectIdentity, extra: &[String]) -> anyhow::Result<i32> {
    let mut git_args = vec![
        "log".to_string(),
        "--no-decorate".to_string(),
        format!("--pretty={LOG_FORMAT}"),
    ];
    git_args.extend_from_slice(extra);
    Git::passthrough(&identity.project_logs_dir, &git_args, &[])
}

/// Display a stored transcript for one entry. `git show --ext-diff` with a
/// diff viewer that just cats the new file dumps the record verbatim.
fn cmd_show(identity: &ProjectIdentity, extra: &[String]) -> anyhow::Result<i32> {
    let mut git_args = vec![
        "show".to_string(),
        "--pretty=format:".to_string(),
        "--ext-diff".to_string(),
    ];
    git_args.extend_from_slice(extra);
    Git::passthrough(
        &identity.project_logs_dir,
        &git_args,
        &[("GIT_EXTERNAL_DIFF", "sh -c \"cat $5\"")],
    )
}

fn cmd_pull(identity: &ProjectIdentity) -> anyhow::Result<i32> {
    sync::pull(&Git, identity)?;
    Ok(0)
}

fn cmd_fix(identity: &ProjectIdentity) -> anyhow::Result<i32> {
    let dir: &Path = identity.project_logs_dir.as_path();
    let confirmed = Confirm::new()
        .with_prompt(format!("rm -rf {} and re-clone", dir.display()))
        .default(false)
        .interact()
        .context("read confirmation")?;
    if !confirmed {
        eprintln!("[runlog] aborted");
        return Ok(0);
    }
    sync::repair(&Git, identity)?;
    Ok(0)
}
