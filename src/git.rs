//! Git adapter for the log store and the invoking repository.
//!
//! All version-control access goes through the [`RepositoryClient`]
//! capability so the orchestrator and synchronizer can be driven by fakes in
//! tests. The production implementation shells out to the `git` binary with
//! an explicit working directory per call; `runlog` never changes its own
//! process-wide cwd.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context as _, Result, anyhow};

use crate::paths;

/// Version-control operations needed by the resolver and the synchronizer.
///
/// Query methods return `Ok(None)` for "git ran but the thing is absent"
/// (not a repository, no remote configured, no commits yet) and `Err` only
/// when git itself could not be invoked or failed unexpectedly.
pub trait RepositoryClient {
    /// Repository root enclosing `cwd`, or `None` when outside any repo.
    fn toplevel(&self, cwd: &Path) -> Result<Option<PathBuf>>;
    /// Configured `remote.origin.url`, or `None` when unset.
    fn remote_url(&self, cwd: &Path) -> Result<Option<String>>;
    /// Commit hash of `HEAD`, or `None` on an unborn branch.
    fn head_revision(&self, cwd: &Path) -> Result<Option<String>>;
    fn init(&self, cwd: &Path) -> Result<()>;
    fn add_remote(&self, cwd: &Path, url: &str) -> Result<()>;
    /// Switch to `branch`, creating or resetting it (`checkout -B`).
    fn checkout_branch(&self, cwd: &Path, branch: &str) -> Result<()>;
    /// Whether `branch` exists on `origin` (via `ls-remote --exit-code`).
    fn remote_branch_exists(&self, cwd: &Path, branch: &str) -> Result<bool>;
    /// Stage a file, bypassing ignore rules (`add --force`).
    fn stage(&self, cwd: &Path, file: &Path) -> Result<()>;
    fn commit(&self, cwd: &Path, message: &str) -> Result<()>;
    /// Rebase the local branch onto `origin/<branch>`.
    fn pull_rebase(&self, cwd: &Path, branch: &str) -> Result<()>;
    fn push(&self, cwd: &Path, branch: &str) -> Result<()>;
    /// Clone a single branch of `url` into `dest`.
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<()>;
    /// Fast-forward pull of `branch` from `origin`.
    fn pull(&self, cwd: &Path, branch: &str) -> Result<()>;
}

/// Subprocess-backed [`RepositoryClient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Git;

impl Git {
    fn run(cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
        if paths::debug_enabled() {
            eprintln!("[runlog] run: git {}", args.join(" "));
        }
        let mut cmd = Command::new("git");
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.args(args)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }

    fn run_checked(cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
        let output = Self::run(cwd, args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run_capture(cwd: &Path, args: &[&str]) -> Result<String> {
        let output = Self::run_checked(Some(cwd), args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Like `run_capture`, but a clean non-zero exit maps to `Ok(None)`.
    fn run_query(cwd: &Path, args: &[&str]) -> Result<Option<String>> {
        let output = Self::run(Some(cwd), args)?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    /// Run a git command with inherited stdio, for display-oriented
    /// subcommands (`history`, `history show`, `history git`).
    ///
    /// Returns the git process exit code.
    pub fn passthrough(cwd: &Path, args: &[String], envs: &[(&str, &str)]) -> Result<i32> {
        if paths::debug_enabled() {
            eprintln!("[runlog] run: git {}", args.join(" "));
        }
        let mut cmd = Command::new("git");
        cmd.current_dir(cwd).args(args);
        for (key, val) in envs {
            cmd.env(key, val);
        }
        let status = cmd
            .status()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        Ok(status.code().unwrap_or(1))
    }
}

impl RepositoryClient for Git {
    fn toplevel(&self, cwd: &Path) -> Result<Option<PathBuf>> {
        Ok(Self::run_query(cwd, &["rev-parse", "--show-toplevel"])?.map(PathBuf::from))
    }

    fn remote_url(&self, cwd: &Path) -> Result<Option<String>> {
        Ok(Self::run_query(cwd, &["config", "remote.origin.url"])?.filter(|url| !url.is_empty()))
    }

    fn head_revision(&self, cwd: &Path) -> Result<Option<String>> {
        Self::run_query(cwd, &["rev-parse", "HEAD"])
    }

    fn init(&self, cwd: &Path) -> Result<()> {
        Self::run_checked(Some(cwd), &["init", "--quiet"])?;
        Ok(())
    }

    fn add_remote(&self, cwd: &Path, url: &str) -> Result<()> {
        Self::run_checked(Some(cwd), &["remote", "add", "origin", url])?;
        Ok(())
    }

    fn checkout_branch(&self, cwd: &Path, branch: &str) -> Result<()> {
        Self::run_checked(Some(cwd), &["checkout", "--quiet", "-B", branch])?;
        Ok(())
    }

    fn remote_branch_exists(&self, cwd: &Path, branch: &str) -> Result<bool> {
        if paths::debug_enabled() {
            eprintln!("[runlog] run: git ls-remote --exit-code origin {branch}");
        }
        // Exit code 2 means "no matching refs"; anything else non-zero is a
        // real failure (unreachable remote, bad credentials).
        let output = Command::new("git")
            .current_dir(cwd)
            .args(["ls-remote", "--exit-code", "origin", branch])
            .stdout(Stdio::null())
            .output()
            .context("spawn git ls-remote")?;
        if output.status.success() {
            return Ok(true);
        }
        if output.status.code() == Some(2) {
            return Ok(false);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(anyhow!("git ls-remote failed: {}", stderr.trim()))
    }

    fn stage(&self, cwd: &Path, file: &Path) -> Result<()> {
        Self::run_checked(Some(cwd), &["add", "--force", &file.to_string_lossy()])?;
        Ok(())
    }

    fn commit(&self, cwd: &Path, message: &str) -> Result<()> {
        Self::run_checked(Some(cwd), &["commit", "--quiet", "--message", message])?;
        Ok(())
    }

    fn pull_rebase(&self, cwd: &Path, branch: &str) -> Result<()> {
        Self::run_checked(Some(cwd), &["pull", "--quiet", "--rebase", "origin", branch])?;
        Ok(())
    }

    fn push(&self, cwd: &Path, branch: &str) -> Result<()> {
        Self::run_checked(Some(cwd), &["push", "--quiet", "origin", branch])?;
        Ok(())
    }

    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        Self::run_checked(
            None,
            &["clone", url, "-b", branch, &dest.to_string_lossy()],
        )?;
        Ok(())
    }

    fn pull(&self, cwd: &Path, branch: &str) -> Result<()> {
        Self::run_checked(Some(cwd), &["pull", "origin", branch])?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::fs;
    use std::process::Command;

    use tempfile::TempDir;

    use super::*;

    fn configure_identity(dir: &Path) {
        for (key, val) in [("user.email", "test@example.com"), ("user.name", "test")] {
            let status = Command::new("git")
                .current_dir(dir)
                .args(["config", key, val])
                .status()
                .unwrap();
            assert!(status.success());
        }
    }

    #[test]
    fn toplevel_outside_a_repository_is_none() {
        let dir = TempDir::new().unwrap();
        // GIT_CEILING can't help here; rely on the tempdir not being nested
        // inside a repo, which holds for the system temp directory.
        let result = Git.toplevel(dir.path()).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn init_then_queries_reflect_repo_state() {
        let dir = TempDir::new().unwrap();
        Git.init(dir.path()).unwrap();

        let top = Git.toplevel(dir.path()).unwrap().expect("toplevel");
        assert_eq!(top.canonicalize().unwrap(), dir.path().canonicalize().unwrap());

        // No remote configured yet, no commits yet.
        assert_eq!(Git.remote_url(dir.path()).unwrap(), None);
        assert_eq!(Git.head_revision(dir.path()).unwrap(), None);

        Git.add_remote(dir.path(), "https://example.com/store.git")
            .unwrap();
        assert_eq!(
            Git.remote_url(dir.path()).unwrap().as_deref(),
            Some("https://example.com/store.git")
        );
    }

    #[test]
    fn stage_commit_produces_head_revision() {
        let dir = TempDir::new().unwrap();
        Git.init(dir.path()).unwrap();
        configure_identity(dir.path());
        Git.checkout_branch(dir.path(), "example/project").unwrap();

        let file = dir.path().join("entry.log");
        fs::write(&file, "hello\n").unwrap();
        Git.stage(dir.path(), &file).unwrap();
        Git.commit(dir.path(), "echo hello").unwrap();

        let head = Git.head_revision(dir.path()).unwrap();
        assert!(head.is_some_and(|h| h.len() >= 7));
    }
}
