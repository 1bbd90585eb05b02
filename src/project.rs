//! Project resolution: map the invoking repository onto a stable project
//! identifier and a local log-store path.
//!
//! The project path defaults to the normalized `remote.origin.url` of the
//! enclosing repository; a `.runlog.toml` file at the repository root may
//! override it with an explicit `project = "name"` entry.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::git::RepositoryClient;
use crate::paths;

/// Name of the optional per-repository override file.
pub const PROJECT_FILE: &str = ".runlog.toml";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("not inside a git repository")]
    NotARepository,
    #[error("repository has no remote.origin.url; cannot derive a project path")]
    NoRemote,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Where one invocation's logs belong. Recomputed per invocation, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    /// Normalized origin URL of the source repository.
    pub repo_path: String,
    /// Logical project name; also the shared branch name.
    pub project_path: String,
    /// `<logs_root>/<project_path>` — the local history working tree.
    pub project_logs_dir: PathBuf,
}

#[derive(Deserialize)]
struct ProjectFile {
    project: Option<String>,
}

/// Resolve the project identity for the repository enclosing `cwd`.
///
/// # Errors
/// [`ResolveError::NotARepository`] when `cwd` is outside any git repository,
/// [`ResolveError::NoRemote`] when the repository has no origin URL.
pub fn resolve(repo: &impl RepositoryClient, cwd: &Path) -> Result<ProjectIdentity, ResolveError> {
    let root = repo.toplevel(cwd)?.ok_or(ResolveError::NotARepository)?;
    let url = repo.remote_url(&root)?.ok_or(ResolveError::NoRemote)?;
    let repo_path = normalize_remote_url(&url);

    let project_path = project_override(&root).unwrap_or_else(|| repo_path.clone());
    let project_logs_dir = paths::logs_root().join(&project_path);

    Ok(ProjectIdentity {
        repo_path,
        project_path,
        project_logs_dir,
    })
}

/// Normalize a remote URL into a filesystem-safe path form:
/// strip an `http(s)://` scheme and a `.git` suffix, and rewrite
/// `user@host:path` SSH syntax to `host/path`.
pub fn normalize_remote_url(url: &str) -> String {
    let mut path = url.trim().to_string();
    if let Ok(re) = Regex::new(r"^https?://") {
        path = re.replace(&path, "").into_owned();
    }
    if let Some(stripped) = path.strip_suffix(".git") {
        path = stripped.to_string();
    }
    if let Ok(re) = Regex::new(r"^[A-Za-z0-9_]+@([A-Za-z0-9._-]+):(.*)$") {
        path = re.replace(&path, "$1/$2").into_owned();
    }
    path
}

/// Read the `project` override from `.runlog.toml` at the repository root.
/// Missing or unparseable files fall back to the default silently; the
/// override is a convenience, not a precondition.
fn project_override(root: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(root.join(PROJECT_FILE)).ok()?;
    let parsed: ProjectFile = toml::from_str(&raw).ok()?;
    parsed.project.filter(|name| !name.is_empty())
}
