//! Test doubles for the capability traits, shared by unit tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::capture::{CaptureError, PtyRunner};
use crate::git::RepositoryClient;

/// Scripted [`RepositoryClient`] that records every call it receives.
///
/// `remote_url` answers `source_url` when queried at `root` (the fake source
/// repository) and `store_url` anywhere else (the log store working tree).
#[derive(Default)]
pub struct RecordingRepo {
    pub root: Option<PathBuf>,
    pub source_url: Option<String>,
    pub store_url: Option<String>,
    pub head: Option<String>,
    pub remote_branch: bool,
    pub fail_push: bool,
    pub calls: RefCell<Vec<String>>,
}

impl RecordingRepo {
    fn log(&self, entry: impl Into<String>) {
        self.calls.borrow_mut().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_index(&self, prefix: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c.starts_with(prefix))
    }
}

impl RepositoryClient for RecordingRepo {
    fn toplevel(&self, _cwd: &Path) -> anyhow::Result<Option<PathBuf>> {
        self.log("toplevel");
        Ok(self.root.clone())
    }

    fn remote_url(&self, cwd: &Path) -> anyhow::Result<Option<String>> {
        self.log(format!("remote_url {}", cwd.display()));
        if self.root.as_deref() == Some(cwd) {
            Ok(self.source_url.clone())
        } else {
            Ok(self.store_url.clone())
        }
    }

    fn head_revision(&self, _cwd: &Path) -> anyhow::Result<Option<String>> {
        self.log("head_revision");
        Ok(self.head.clone())
    }

    fn init(&self, _cwd: &Path) -> anyhow::Result<()> {
        self.log("init");
        Ok(())
    }

    fn add_remote(&self, _cwd: &Path, url: &str) -> anyhow::Result<()> {
        self.log(format!("add_remote {url}"));
        Ok(())
    }

    fn checkout_branch(&self, _cwd: &Path, branch: &str) -> anyhow::Result<()> {
        self.log(format!("checkout {branch}"));
        Ok(())
    }

    fn remote_branch_exists(&self, _cwd: &Path, branch: &str) -> anyhow::Result<bool> {
        self.log(format!("ls-remote {branch}"));
        Ok(self.remote_branch)
    }

    fn stage(&self, _cwd: &Path, file: &Path) -> anyhow::Result<()> {
        self.log(format!("stage {}", file.display()));
        Ok(())
    }

    fn commit(&self, _cwd: &Path, message: &str) -> anyhow::Result<()> {
        self.log(format!("commit {message}"));
        Ok(())
    }

    fn pull_rebase(&self, _cwd: &Path, branch: &str) -> anyhow::Result<()> {
        self.log(format!("pull_rebase {branch}"));
        Ok(())
    }

    fn push(&self, _cwd: &Path, branch: &str) -> anyhow::Result<()> {
        self.log(format!("push {branch}"));
        if self.fail_push {
            anyhow::bail!("push rejected");
        }
        Ok(())
    }

    fn clone_branch(&self, url: &str, branch: &str, _dest: &Path) -> anyhow::Result<()> {
        self.log(format!("clone {url} {branch}"));
        Ok(())
    }

    fn pull(&self, _cwd: &Path, branch: &str) -> anyhow::Result<()> {
        self.log(format!("pull {branch}"));
        Ok(())
    }
}

/// [`PtyRunner`] that writes a canned transcript and returns a fixed code.
pub struct FakePty {
    pub exit_code: i32,
    pub transcript: Vec<u8>,
}

impl PtyRunner for FakePty {
    fn run(&self, _argv: &[String], transcript: &Path) -> Result<i32, CaptureError> {
        std::fs::write(transcript, &self.transcript)?;
        Ok(self.exit_code)
    }
}
