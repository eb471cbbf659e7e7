//! Configuration for the triage pipeline.
//!
//! Centralized configuration with sensible defaults; every knob is
//! serde-serializable so a caller can persist or override settings.

use crate::io::IoLimits;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Master configuration for a triage engine instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Bounded file reading.
    pub io: IoLimits,
    /// String extraction configuration.
    pub strings: StringConfig,
    /// Entropy windowing configuration.
    pub entropy: EntropyConfig,
    /// Disassembly plausibility configuration.
    pub disasm: DisasmConfig,
    /// Partition extraction configuration.
    pub partitions: PartitionConfig,
    /// External tool invocation configuration.
    pub tools: ToolConfig,
}

/// String extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StringConfig {
    /// Minimum printable run length; shorter runs are discarded entirely.
    pub min_length: usize,
}

impl Default for StringConfig {
    fn default() -> Self {
        Self { min_length: 4 }
    }
}

/// Entropy windowing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropyConfig {
    /// Non-overlapping window size in bytes.
    pub window_size: usize,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self { window_size: 8192 }
    }
}

/// Disassembly plausibility settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisasmConfig {
    /// Cap on the prefix handed to each decoder profile.
    pub max_prefix_bytes: usize,
}

impl Default for DisasmConfig {
    fn default() -> Self {
        Self {
            max_prefix_bytes: 200_000,
        }
    }
}

/// Partition extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Carved files at or below this size are treated as noise.
    pub min_partition_bytes: u64,
    /// Root directory for extraction output; each run gets a unique
    /// subdirectory underneath it.
    pub extract_root: PathBuf,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            min_partition_bytes: 1024,
            extract_root: PathBuf::from("_extracted"),
        }
    }
}

/// External tool timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Timeout for the file-type identifier, in seconds.
    pub file_timeout_secs: u64,
    /// Timeout for the partition carver, in seconds.
    pub carve_timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            file_timeout_secs: 10,
            carve_timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.strings.min_length, 4);
        assert_eq!(cfg.disasm.max_prefix_bytes, 200_000);
        assert_eq!(cfg.partitions.min_partition_bytes, 1024);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let cfg = AnalysisConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entropy.window_size, cfg.entropy.window_size);
        assert_eq!(back.tools.file_timeout_secs, cfg.tools.file_timeout_secs);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str(r#"{"strings":{"min_length":6}}"#).unwrap();
        assert_eq!(cfg.strings.min_length, 6);
        assert_eq!(cfg.partitions.min_partition_bytes, 1024);
    }
}
