//! Bounded file reading.
//!
//! All file access in the pipeline goes through these helpers so a
//! pathological input (device node, multi-gigabyte image) cannot exhaust
//! memory. Reads past the cap are truncated with a warning, never an
//! error; an unreadable path is the one fatal condition.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Resource limits for file reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoLimits {
    pub max_read_bytes: u64,
}

impl Default for IoLimits {
    fn default() -> Self {
        Self {
            max_read_bytes: 64 * 1024 * 1024, // 64 MiB
        }
    }
}

/// Read a whole blob from disk, capped at `limits.max_read_bytes`.
pub fn read_blob(path: &Path, limits: &IoLimits) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    debug!(path = %path.display(), size_bytes = size, "reading blob");

    if size > limits.max_read_bytes {
        warn!(
            path = %path.display(),
            size_bytes = size,
            cap = limits.max_read_bytes,
            "blob exceeds read cap; analyzing truncated prefix"
        );
    }

    let mut data = Vec::with_capacity(size.min(limits.max_read_bytes) as usize);
    file.take(limits.max_read_bytes).read_to_end(&mut data)?;
    Ok(data)
}

/// File size without opening the file for reading.
pub fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}
