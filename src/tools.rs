//! External tool capabilities: file-type identification and partition
//! carving.
//!
//! Both tools are optional. Every failure mode (binary missing, non-zero
//! exit, timeout, unparseable output) degrades to `None` with a warning;
//! the pipeline proceeds without the signal. Timeouts are enforced with a
//! short-lived tokio runtime so a wedged child process cannot stall the
//! whole analysis.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{FirmscopeError, Result};

/// Identifies a blob's coarse type from its on-disk form, like the
/// `file` utility does.
pub trait FileTypeTool: Send + Sync {
    /// One-line classification, or `None` when the tool is unavailable or
    /// produced nothing useful.
    fn identify(&self, path: &Path) -> Option<String>;
}

/// Carves embedded partitions out of a firmware image into a directory.
pub trait PartitionCarver: Send + Sync {
    /// Run the carver; `None` when it is unavailable or failed outright.
    fn carve(&self, path: &Path, out_dir: &Path) -> Option<CarveOutcome>;
}

/// What a carve run produced.
#[derive(Debug, Default)]
pub struct CarveOutcome {
    /// Every regular file under the output directory, in sorted path
    /// order for deterministic downstream batching.
    pub files: Vec<PathBuf>,
    /// Leading lines of the tool's stdout, kept for diagnostics.
    pub log_lines: Vec<String>,
}

/// Run an external command with a hard wall-clock timeout. A missing
/// binary or spawn failure surfaces as `Io`, an expired budget as
/// `Timeout`; the adapters translate either into an absent signal.
fn run_command(program: &str, args: &[&OsStr], timeout: Duration) -> Result<Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args).kill_on_drop(true);
        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(FirmscopeError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    })
}

/// `file -b` wrapper.
#[derive(Debug)]
pub struct FileCommand {
    timeout: Duration,
}

impl FileCommand {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl FileTypeTool for FileCommand {
    fn identify(&self, path: &Path) -> Option<String> {
        let output = match run_command(
            "file",
            &[OsStr::new("-b"), path.as_os_str()],
            self.timeout,
        ) {
            Ok(output) => output,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "file tool unavailable");
                return None;
            }
        };
        if !output.status.success() {
            warn!(path = %path.display(), status = ?output.status, "file tool exited non-zero");
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return None;
        }
        debug!(path = %path.display(), file_type = %text, "file type identified");
        Some(text)
    }
}

/// `binwalk -e` wrapper.
#[derive(Debug)]
pub struct BinwalkCarver {
    timeout: Duration,
}

impl BinwalkCarver {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Lines of stdout kept in the carve log.
const CARVE_LOG_LINES: usize = 5;

impl PartitionCarver for BinwalkCarver {
    fn carve(&self, path: &Path, out_dir: &Path) -> Option<CarveOutcome> {
        if let Err(e) = std::fs::create_dir_all(out_dir) {
            warn!(out_dir = %out_dir.display(), error = %e, "cannot create carve directory");
            return None;
        }

        let output = match run_command(
            "binwalk",
            &[
                OsStr::new("-e"),
                OsStr::new("-C"),
                out_dir.as_os_str(),
                path.as_os_str(),
            ],
            self.timeout,
        ) {
            Ok(output) => output,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "carver unavailable");
                return None;
            }
        };
        // binwalk exits non-zero on partially failed extractions that
        // still produced usable files, so the exit status is ignored.
        let log_lines = String::from_utf8_lossy(&output.stdout)
            .lines()
            .take(CARVE_LOG_LINES)
            .map(str::to_string)
            .collect();

        let mut files = Vec::new();
        collect_files(out_dir, &mut files);
        files.sort();
        debug!(path = %path.display(), carved = files.len(), "carve complete");
        Some(CarveOutcome { files, log_lines })
    }
}

/// Recursively gather regular files; unreadable directories are skipped.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot list carve output");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => collect_files(&path, out),
            Ok(ft) if ft.is_file() => out.push(path),
            _ => {}
        }
    }
}
