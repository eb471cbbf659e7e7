//! Pipeline orchestration.
//!
//! The engine wires the pure analysis stages together and injects the
//! three optional capabilities (file-type tool, partition carver,
//! disassembly decoders) behind trait objects. Every capability is
//! individually absent-able: the pipeline always produces a report from
//! whatever signals remain.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::container::ContainerInfo;
use crate::disasm::{ArchProfile, DecoderBank, DisasmScore, PlausibilityEngine};
use crate::error::Result;
use crate::ranker::{self, SignalSet};
use crate::report::{AnalysisReport, PartitionBatchReport, PartitionReport};
use crate::strings;
use crate::tools::{BinwalkCarver, FileCommand, FileTypeTool, PartitionCarver};
use crate::{entropy, io, protocol};

/// The triage engine. Cheap to construct; holds no per-blob state, so one
/// instance serves any number of `analyze` calls, including concurrently.
pub struct Engine {
    config: AnalysisConfig,
    file_tool: Option<Box<dyn FileTypeTool>>,
    carver: Option<Box<dyn PartitionCarver>>,
    disasm: Option<Box<dyn PlausibilityEngine>>,
}

impl Engine {
    /// Engine with the default capability set: the `file` utility,
    /// binwalk carving, and the built-in decoder bank.
    pub fn with_defaults(config: AnalysisConfig) -> Self {
        let file_tool = FileCommand::new(config.tools.file_timeout_secs);
        let carver = BinwalkCarver::new(config.tools.carve_timeout_secs);
        Self {
            config,
            file_tool: Some(Box::new(file_tool)),
            carver: Some(Box::new(carver)),
            disasm: Some(Box::new(DecoderBank)),
        }
    }

    /// Engine with explicit capabilities; `None` disables that signal.
    pub fn new(
        config: AnalysisConfig,
        file_tool: Option<Box<dyn FileTypeTool>>,
        carver: Option<Box<dyn PartitionCarver>>,
        disasm: Option<Box<dyn PlausibilityEngine>>,
    ) -> Self {
        Self {
            config,
            file_tool,
            carver,
            disasm,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze an in-memory blob under a synthetic origin label. The
    /// file-type tool needs an on-disk path and is skipped here.
    pub fn analyze(&self, data: &[u8], origin: &str) -> AnalysisReport {
        self.analyze_inner(data, origin, None)
    }

    /// Analyze a blob on disk. The only error is an unreadable path;
    /// everything past the read degrades to missing signals.
    pub fn analyze_path(&self, path: &Path) -> Result<AnalysisReport> {
        let data = io::read_blob(path, &self.config.io)?;
        let file_type = self
            .file_tool
            .as_ref()
            .and_then(|tool| tool.identify(path));
        Ok(self.analyze_inner(&data, &path.display().to_string(), file_type))
    }

    fn analyze_inner(
        &self,
        data: &[u8],
        origin: &str,
        file_type: Option<String>,
    ) -> AnalysisReport {
        let span = info_span!("analyze", origin, size = data.len());
        let _guard = span.enter();

        let entropy_total = entropy::shannon_entropy(data);
        let windows = entropy::windowed_entropy(data, self.config.entropy.window_size);
        let entropy_window_mean = entropy::mean(&windows);

        let runs = strings::extract_strings(data, self.config.strings.min_length);
        let strings_summary = strings::summarize(&runs);

        let container = ContainerInfo::parse(data);
        let disasm = self.disasm_scores(data);
        let protocols = protocol::infer(data, &runs);

        let ranking = ranker::rank(&SignalSet {
            container: container.as_ref(),
            file_type: file_type.as_deref(),
            strings: &runs,
            disasm: &disasm,
            protocols: &protocols,
        });

        info!(
            origin,
            entropy = entropy_total,
            strings = strings_summary.count,
            candidates = ranking.len(),
            protocols = protocols.len(),
            best = ranking.best().map(|e| e.label.as_str()).unwrap_or("-"),
            "analysis complete"
        );

        AnalysisReport {
            path: origin.to_string(),
            size: data.len() as u64,
            entropy: entropy_total,
            entropy_window_mean,
            strings: strings_summary,
            container,
            file_type,
            ranking,
            protocols,
            analyzed_at: chrono::Utc::now(),
        }
    }

    fn disasm_scores(&self, data: &[u8]) -> Vec<(ArchProfile, DisasmScore)> {
        match &self.disasm {
            Some(engine) => engine.score(data, self.config.disasm.max_prefix_bytes),
            None => {
                debug!("no disassembly capability; skipping decode probing");
                Vec::new()
            }
        }
    }

    /// Carve an image into partitions and analyze each one.
    ///
    /// The batch completes regardless of individual partition failures;
    /// a partition that cannot be analyzed gets an inconclusive report
    /// with its error recorded. An absent or failed carver yields an
    /// empty batch, not an error.
    pub fn extract_and_analyze(&self, path: &Path) -> PartitionBatchReport {
        let span = info_span!("extract", path = %path.display());
        let _guard = span.enter();

        let Some(carver) = self.carver.as_ref() else {
            debug!("no carver capability; skipping extraction");
            return PartitionBatchReport::default();
        };

        let run_dir = self
            .config
            .partitions
            .extract_root
            .join(format!("run-{}", Uuid::new_v4()));
        let Some(outcome) = carver.carve(path, &run_dir) else {
            warn!(path = %path.display(), "carver produced no output");
            return PartitionBatchReport::default();
        };

        let min_bytes = self.config.partitions.min_partition_bytes;
        let survivors: Vec<_> = outcome
            .files
            .into_iter()
            .filter(|p| match io::file_size(p) {
                Ok(len) => len > min_bytes,
                Err(e) => {
                    warn!(partition = %p.display(), error = %e, "cannot stat carved file");
                    false
                }
            })
            .collect();
        info!(partitions = survivors.len(), "carve yielded partitions");

        // par_iter keeps input order on collect, so the batch is stable.
        let partitions: Vec<PartitionReport> = survivors
            .par_iter()
            .map(|p| {
                let label = p.display().to_string();
                match self.analyze_path(p) {
                    Ok(report) => PartitionReport {
                        path: label,
                        report,
                        error: None,
                    },
                    Err(e) => {
                        warn!(partition = %label, error = %e, "partition analysis failed");
                        PartitionReport {
                            path: label.clone(),
                            report: AnalysisReport::inconclusive(&label),
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect();

        PartitionBatchReport {
            partitions,
            carver_log: outcome.log_lines,
        }
    }
}
