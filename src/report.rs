//! Report data model: everything one `analyze` call returns.
//!
//! All types here are immutable once constructed, carry no persistence
//! logic, and serialize flat through serde for storage by external layers.

use crate::container::ContainerInfo;
use crate::strings::StringsSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One accumulated score under a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub label: String,
    pub score: i64,
}

/// Insertion-ordered additive score accumulator.
///
/// Labels accumulate integer contributions; reporting order is descending
/// score with ties broken by first-insertion order, which makes "top
/// candidate" deterministic without relying on any map iteration order.
/// An empty ranking is a legitimate "inconclusive" outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    entries: Vec<RankEntry>,
}

impl Ranking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` under `label`, creating the entry on first contribution.
    pub fn add(&mut self, label: &str, delta: i64) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.label == label) {
            e.score += delta;
        } else {
            self.entries.push(RankEntry {
                label: label.to_string(),
                score: delta,
            });
        }
    }

    pub fn score(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.score)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All entries, descending by score; ties keep first-insertion order.
    pub fn ranked(&self) -> Vec<&RankEntry> {
        let mut v: Vec<&RankEntry> = self.entries.iter().collect();
        // sort_by is stable, so equal scores keep insertion order
        v.sort_by(|a, b| b.score.cmp(&a.score));
        v
    }

    /// Top `n` entries in ranked order.
    pub fn top(&self, n: usize) -> Vec<&RankEntry> {
        let mut v = self.ranked();
        v.truncate(n);
        v
    }

    /// The single best candidate, if any signal was seen at all.
    pub fn best(&self) -> Option<&RankEntry> {
        self.ranked().into_iter().next()
    }

    /// Flat label -> score map for storage layers.
    pub fn to_map(&self) -> BTreeMap<String, i64> {
        self.entries
            .iter()
            .map(|e| (e.label.clone(), e.score))
            .collect()
    }
}

/// Recognized secure-protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolFamily {
    #[serde(rename = "TLS")]
    Tls,
    #[serde(rename = "SSH")]
    Ssh,
    #[serde(rename = "IKE/IPsec")]
    IkeIpsec,
    #[serde(rename = "GENERIC_SECURE_PROTO")]
    GenericSecure,
}

impl ProtocolFamily {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolFamily::Tls => "TLS",
            ProtocolFamily::Ssh => "SSH",
            ProtocolFamily::IkeIpsec => "IKE/IPsec",
            ProtocolFamily::GenericSecure => "GENERIC_SECURE_PROTO",
        }
    }

    /// Ranking label for the confidence nudge; the generic fallback never
    /// contributes to the ranking.
    pub fn ranking_label(&self) -> Option<String> {
        match self {
            ProtocolFamily::GenericSecure => None,
            f => Some(format!("has_{}", f.name())),
        }
    }
}

/// The four ordered session phases whose static evidence is inferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFlags {
    pub initialization: bool,
    pub handshake: bool,
    pub key_exchange: bool,
    pub encrypted_phase: bool,
}

impl PhaseFlags {
    pub fn all() -> Self {
        Self {
            initialization: true,
            handshake: true,
            key_exchange: true,
            encrypted_phase: true,
        }
    }
}

/// Evidence for one detected protocol family.
///
/// `keyword_hits` and `record_header_count` justify the phase booleans for
/// explainability; they are not meant for re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolEvidence {
    pub family: ProtocolFamily,
    pub phases: PhaseFlags,
    pub keyword_hits: Vec<String>,
    pub record_header_count: usize,
}

/// The unit returned by one `analyze` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Origin label: a filesystem path or a synthetic tag like `<memory>`.
    pub path: String,
    pub size: u64,
    /// Shannon entropy over the whole blob.
    pub entropy: f64,
    /// Mean of the windowed entropy sweep; absent for empty input.
    pub entropy_window_mean: Option<f64>,
    pub strings: StringsSummary,
    pub container: Option<ContainerInfo>,
    /// Raw text from the file-type identifier, when available.
    pub file_type: Option<String>,
    pub ranking: Ranking,
    pub protocols: Vec<ProtocolEvidence>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// A well-formed zero-signal report; used when a partition cannot be
    /// read. Absence of evidence is an outcome, not a failure.
    pub fn inconclusive(path: &str) -> Self {
        Self {
            path: path.to_string(),
            size: 0,
            entropy: 0.0,
            entropy_window_mean: None,
            strings: StringsSummary::default(),
            container: None,
            file_type: None,
            ranking: Ranking::new(),
            protocols: Vec::new(),
            analyzed_at: Utc::now(),
        }
    }
}

/// One partition's result inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionReport {
    pub path: String,
    pub report: AnalysisReport,
    /// Set when this partition failed to read or analyze; the batch as a
    /// whole still completes.
    pub error: Option<String>,
}

/// Ordered per-partition results from the partition pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionBatchReport {
    pub partitions: Vec<PartitionReport>,
    /// First few lines of the carver tool log, for diagnostics only.
    pub carver_log: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_accumulates_under_one_label() {
        let mut r = Ranking::new();
        r.add("mips", 4);
        r.add("mips", 4);
        r.add("arm", 10);
        assert_eq!(r.score("mips"), Some(8));
        assert_eq!(r.score("arm"), Some(10));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn ranked_is_descending_with_stable_ties() {
        let mut r = Ranking::new();
        r.add("first", 5);
        r.add("second", 5);
        r.add("third", 9);
        let order: Vec<&str> = r.ranked().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(order, vec!["third", "first", "second"]);
        assert_eq!(r.best().map(|e| e.label.as_str()), Some("third"));
    }

    #[test]
    fn empty_ranking_is_inconclusive_not_error() {
        let r = Ranking::new();
        assert!(r.is_empty());
        assert!(r.best().is_none());
        assert!(r.top(5).is_empty());
    }

    #[test]
    fn ranking_serializes_to_flat_map() {
        let mut r = Ranking::new();
        r.add("arm64", 12);
        r.add("has_TLS", 3);
        let map = r.to_map();
        assert_eq!(map.get("arm64"), Some(&12));
        assert_eq!(map.get("has_TLS"), Some(&3));
    }

    #[test]
    fn protocol_family_names_and_labels() {
        assert_eq!(ProtocolFamily::Tls.name(), "TLS");
        assert_eq!(
            ProtocolFamily::IkeIpsec.ranking_label().as_deref(),
            Some("has_IKE/IPsec")
        );
        assert_eq!(ProtocolFamily::GenericSecure.ranking_label(), None);
    }

    #[test]
    fn report_roundtrips_through_json() {
        let mut ranking = Ranking::new();
        ranking.add("riscv", 10);
        let report = AnalysisReport {
            ranking,
            protocols: vec![ProtocolEvidence {
                family: ProtocolFamily::Ssh,
                phases: PhaseFlags::all(),
                keyword_hits: vec!["SSH-2.0-OpenSSH".into()],
                record_header_count: 0,
            }],
            ..AnalysisReport::inconclusive("fw.bin")
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ranking.score("riscv"), Some(10));
        assert_eq!(back.protocols[0].family, ProtocolFamily::Ssh);
        assert!(back.protocols[0].phases.encrypted_phase);
    }
}
