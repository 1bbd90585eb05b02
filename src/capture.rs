//! Terminal capture: run a command inside a pseudo-terminal and keep a
//! byte-for-byte transcript of the session.
//!
//! The production implementation wraps `script(1)`, whose invocation differs
//! per OS: util-linux `script` takes the command as a single `--command`
//! string, BSD `script` on macOS takes the argv directly. The variant is
//! selected once at startup; anything else is an unsupported platform.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use crate::paths;

/// Env var set on the captured child so nested invocations can detect that
/// they are already running inside a capture.
pub const REENTRANCY_MARKER: &str = "RUNLOG";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(&'static str),
    #[error("`script` binary not found on PATH")]
    ScriptMissing,
    #[error("failed to run capture wrapper: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability to execute an argv under a pseudo-terminal, writing the full
/// session transcript to `transcript` and returning the child's exit code.
///
/// Implementations must produce the transcript file even when the child
/// exits non-zero or dies to a signal; callers read it unconditionally.
pub trait PtyRunner {
    fn run(&self, argv: &[String], transcript: &Path) -> Result<i32, CaptureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptStyle {
    /// util-linux: `script --return --quiet --command 'sh -c "..."' <file>`.
    /// `--return` makes script propagate the child's exit status.
    UtilLinux,
    /// BSD: `script -q <file> <argv...>`.
    Bsd,
}

/// [`PtyRunner`] backed by the `script(1)` binary.
#[derive(Debug, Clone, Copy)]
pub struct ScriptRunner {
    style: ScriptStyle,
}

impl ScriptRunner {
    /// Pick the invocation variant for the host platform.
    ///
    /// # Errors
    /// [`CaptureError::UnsupportedPlatform`] on platforms without a known
    /// `script` variant, [`CaptureError::ScriptMissing`] when the binary is
    /// not on `PATH`.
    pub fn detect() -> Result<Self, CaptureError> {
        let style = if cfg!(target_os = "linux") {
            ScriptStyle::UtilLinux
        } else if cfg!(target_os = "macos") {
            ScriptStyle::Bsd
        } else {
            return Err(CaptureError::UnsupportedPlatform(std::env::consts::OS));
        };
        which::which("script").map_err(|_| CaptureError::ScriptMissing)?;
        Ok(Self { style })
    }

    fn command(self, argv: &[String], transcript: &Path) -> Command {
        let mut cmd = Command::new("script");
        match self.style {
            ScriptStyle::UtilLinux => {
                let escaped = argv
                    .iter()
                    .map(|a| shell_escape(a))
                    .collect::<Vec<_>>()
                    .join(" ");
                cmd.args(["--return", "--quiet", "--command"])
                    .arg(format!("sh -c \"{escaped}\""))
                    .arg(transcript);
            }
            ScriptStyle::Bsd => {
                cmd.arg("-q").arg(transcript).args(argv);
            }
        }
        cmd
    }
}

impl PtyRunner for ScriptRunner {
    fn run(&self, argv: &[String], transcript: &Path) -> Result<i32, CaptureError> {
        if paths::debug_enabled() {
            eprintln!("[runlog] run: {}", argv.join(" "));
        }
        let mut cmd = self.command(argv, transcript);
        // Marker is scoped to the child process; the parent's environment
        // stays untouched.
        cmd.env(REENTRANCY_MARKER, "1");
        let status = cmd.status()?;
        Ok(exit_code_from_status(status))
    }
}

/// Extract an exit code from a process status, mapping signals to 128+N on Unix.
pub fn exit_code_from_status(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .unwrap_or_else(|| status.signal().map_or(1, |s| 128 + s))
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}

/// Escape a string for safe inclusion in a shell command (single-quote wrapping).
pub(crate) fn shell_escape(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}
