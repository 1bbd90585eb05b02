//! History store synchronization: land a freshly written record on the
//! shared per-project branch, tolerating missing local and remote state.
//!
//! The shared store serializes pushes and rejects non-fast-forward updates;
//! rebasing onto the remote branch before pushing linearizes entries written
//! concurrently on other machines. One attempt per execution, no retry.

use std::path::Path;

use anyhow::{Context as _, Result, anyhow};

use crate::git::RepositoryClient;
use crate::project::ProjectIdentity;

/// Env var naming the shared remote store. Required whenever a remote
/// operation is about to happen; its absence fails loudly at that point.
pub const LOGS_REPOSITORY_VAR: &str = "RUNLOG_LOGS_REPOSITORY";

/// The configured shared store location.
///
/// # Errors
/// When `RUNLOG_LOGS_REPOSITORY` is unset or empty.
pub fn logs_repository() -> Result<String> {
    std::env::var(LOGS_REPOSITORY_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{LOGS_REPOSITORY_VAR} not set"))
}

/// One-line commit summary for a captured execution: the joined command,
/// `[failed] `-prefixed when it exited non-zero.
pub fn headline(command: &[String], exit_code: i32) -> String {
    let joined = command.join(" ");
    if exit_code == 0 {
        joined
    } else {
        format!("[failed] {joined}")
    }
}

/// Commit `record` on the project branch and push it to the shared store.
///
/// Initializes the working tree and registers the store as `origin` on first
/// use. When the remote branch already exists the new commit is rebased onto
/// it before pushing, so concurrent entries from other machines survive.
///
/// A working tree whose `origin` differs from the configured store is used
/// as-is, with a warning; silently re-pointing it could strand history in
/// the wrong repository.
pub fn sync_record(
    repo: &impl RepositoryClient,
    identity: &ProjectIdentity,
    record: &Path,
    message: &str,
) -> Result<()> {
    let dir = identity.project_logs_dir.as_path();

    match repo.remote_url(dir)? {
        None => {
            let store = logs_repository()?;
            repo.init(dir)?;
            repo.add_remote(dir, &store)?;
        }
        Some(current) => {
            if let Ok(store) = std::env::var(LOGS_REPOSITORY_VAR)
                && !store.is_empty()
                && store != current
            {
                eprintln!(
                    "[runlog] warning: log store origin is {current} but \
                     {LOGS_REPOSITORY_VAR} is {store}; keeping the existing remote"
                );
            }
        }
    }

    repo.checkout_branch(dir, &identity.project_path)?;
    let remote_has_branch = repo.remote_branch_exists(dir, &identity.project_path)?;

    repo.stage(dir, record)?;
    repo.commit(dir, message)?;

    if remote_has_branch {
        repo.pull_rebase(dir, &identity.project_path)?;
    }
    repo.push(dir, &identity.project_path)?;
    Ok(())
}

/// Clone the project branch into place, or fast-forward an existing tree.
pub fn pull(repo: &impl RepositoryClient, identity: &ProjectIdentity) -> Result<()> {
    let dir = identity.project_logs_dir.as_path();
    if dir.exists() {
        repo.pull(dir, &identity.project_path)
    } else {
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        repo.clone_branch(&logs_repository()?, &identity.project_path, dir)
    }
}

/// Destructively replace the local working tree with a fresh clone of the
/// remote project branch. Callers must confirm with the operator first.
///
/// A failed re-clone is reported rather than fatal: the remote branch may
/// simply not exist yet, and the next `exec` will recreate the tree.
pub fn repair(repo: &impl RepositoryClient, identity: &ProjectIdentity) -> Result<()> {
    let dir = identity.project_logs_dir.as_path();
    let store = logs_repository()?;

    if dir.exists() {
        std::fs::remove_dir_all(dir).with_context(|| format!("remove {}", dir.display()))?;
    }
    if let Some(parent) = dir.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    if let Err(e) = repo.clone_branch(&store, &identity.project_path, dir) {
        eprintln!("[runlog] re-clone failed (branch may not exist yet): {e:#}");
    }
    Ok(())
}
