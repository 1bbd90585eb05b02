//! Log record persistence: one immutable file per captured execution.
//!
//! A record is a UTF-8 `key: value` metadata header, a literal `---`
//! separator line, then the raw transcript bytes appended verbatim. The
//! header is made durable before the transcript is appended so a reader can
//! always parse it even if appending was interrupted. Records are written
//! once, at a path derived from the capture timestamp; same-microsecond
//! collisions are an accepted overwrite risk.

use std::fs::{File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};

/// Separator between the metadata header and the transcript bytes.
pub const HEADER_SEPARATOR: &str = "---";

/// Metadata for one captured execution.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// The wrapped argv; never empty.
    pub command: Vec<String>,
    pub user: String,
    pub repo_path: String,
    pub project_path: String,
    /// HEAD of the source repository at capture time, when available.
    pub git_revision: Option<String>,
    pub tool_version: String,
    pub exit_code: i32,
    /// Capture start time; determines the storage path.
    pub timestamp: DateTime<Local>,
}

/// Storage path for a record captured at `timestamp`:
/// `<logs_dir>/YYYY/MM/DD/HHMMSS.microseconds.log`.
pub fn record_path(logs_dir: &Path, timestamp: &DateTime<Local>) -> PathBuf {
    logs_dir
        .join(timestamp.format("%Y").to_string())
        .join(timestamp.format("%m").to_string())
        .join(timestamp.format("%d").to_string())
        .join(format!("{}.log", timestamp.format("%H%M%S%.6f")))
}

fn header(record: &LogRecord) -> Result<String> {
    let command_json =
        serde_json::to_string(&record.command).context("serialize command argv")?;
    let mut out = String::new();
    out.push_str(&format!("command:     {command_json}\n"));
    out.push_str(&format!("user:        {}\n", record.user));
    out.push_str(&format!("repoPath:    {}\n", record.repo_path));
    out.push_str(&format!("projectPath: {}\n", record.project_path));
    out.push_str(&format!(
        "gitRevision: {}\n",
        record.git_revision.as_deref().unwrap_or("")
    ));
    out.push_str(&format!("toolVersion: {}\n", record.tool_version));
    out.push_str(&format!("exitCode:    {}\n", record.exit_code));
    out.push_str(HEADER_SEPARATOR);
    out.push('\n');
    Ok(out)
}

/// Persist `record` under `logs_dir`, appending the transcript bytes from
/// `transcript` after the header. Creates any missing date directories.
/// Returns the record path.
///
/// # Errors
/// Any IO failure here is fatal to the invocation: the caller must not
/// attempt synchronization for a record that was not fully written.
pub fn write(record: &LogRecord, logs_dir: &Path, transcript: &Path) -> Result<PathBuf> {
    let path = record_path(logs_dir, &record.timestamp);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }

    // Header first, synced before any transcript byte lands, so a partial
    // record is still parseable up to the separator.
    {
        let mut file = File::create(&path)
            .with_context(|| format!("create log record {}", path.display()))?;
        file.write_all(header(record)?.as_bytes())
            .context("write record header")?;
        file.sync_all().context("sync record header")?;
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(&path)
        .context("reopen record for transcript append")?;
    let mut source = File::open(transcript)
        .with_context(|| format!("open transcript {}", transcript.display()))?;
    io::copy(&mut source, &mut file).context("append transcript bytes")?;

    Ok(path)
}

/// Identity of the invoking principal, from the environment.
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
