//! Logs-root resolution and debug-flag helpers.
//!
//! Priority for the logs root directory:
//!   1. `RUNLOG_LOGS_DIR` env var (if set and non-empty)
//!   2. `~/.runlog/logs` under the user's home directory

use std::path::PathBuf;

/// Returns the root directory under which per-project log stores live.
///
/// Each project gets `<logs_root>/<project_path>` as its working tree.
/// Falls back to a relative `.runlog/logs` when no home directory can be
/// determined (containers with no passwd entry).
pub fn logs_root() -> PathBuf {
    if let Ok(dir) = std::env::var("RUNLOG_LOGS_DIR")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    dirs::home_dir().map_or_else(
        || PathBuf::from(".runlog/logs"),
        |home| home.join(".runlog").join("logs"),
    )
}

/// True when `RUNLOG_DEBUG` is set: every underlying subprocess invocation
/// is echoed to stderr.
pub fn debug_enabled() -> bool {
    std::env::var("RUNLOG_DEBUG").is_ok_and(|v| !v.is_empty())
}
