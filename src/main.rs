//! Command-line front end for firmscope.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use firmscope::report::{AnalysisReport, PartitionBatchReport};
use firmscope::{AnalysisConfig, Engine};

#[derive(Parser, Debug)]
#[command(
    name = "firmscope",
    version,
    about = "Static firmware triage: architecture ranking and secure-protocol phase inference"
)]
struct Cli {
    /// Firmware image or binary blob to analyze.
    path: PathBuf,

    /// Emit one JSON document instead of the text report.
    #[arg(long)]
    json: bool,

    /// Skip partition carving and analyze only the top-level blob.
    #[arg(long)]
    no_extract: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[derive(Serialize)]
struct CombinedOutput {
    image: AnalysisReport,
    partitions: PartitionBatchReport,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        firmscope::logging::init_tracing_json();
    } else {
        firmscope::logging::init_tracing();
    }

    let engine = Engine::with_defaults(AnalysisConfig::default());

    let image = engine
        .analyze_path(&cli.path)
        .with_context(|| format!("cannot analyze {}", cli.path.display()))?;

    let partitions = if cli.no_extract {
        PartitionBatchReport::default()
    } else {
        engine.extract_and_analyze(&cli.path)
    };

    if cli.json {
        let combined = CombinedOutput { image, partitions };
        println!("{}", serde_json::to_string_pretty(&combined)?);
    } else {
        print_report(&image);
        print_batch(&partitions);
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("=== {} ===", report.path);
    println!("size:            {} bytes", report.size);
    println!("entropy:         {:.4} bits/byte", report.entropy);
    if let Some(mean) = report.entropy_window_mean {
        println!("window entropy:  {:.4} (mean)", mean);
    }
    println!(
        "strings:         {} (avg len {:.1}{})",
        report.strings.count,
        report.strings.avg_len,
        if report.strings.toolchain_gcc {
            ", gcc toolchain"
        } else {
            ""
        }
    );
    if let Some(ft) = &report.file_type {
        println!("file type:       {}", ft);
    }
    if let Some(c) = &report.container {
        let name = c.machine_name().unwrap_or("unknown");
        println!(
            "container:       ELF {:?} {:?} machine={} ({})",
            c.class, c.endianness, c.machine, name
        );
    }

    if report.ranking.is_empty() {
        println!("architecture:    inconclusive (no signals)");
    } else {
        println!("architecture ranking:");
        for entry in report.ranking.ranked() {
            println!("  {:>6}  {}", entry.score, entry.label);
        }
    }

    if report.protocols.is_empty() {
        println!("protocols:       none detected");
    } else {
        println!("protocols:");
        for ev in &report.protocols {
            println!(
                "  {:<22} init={} handshake={} key_exchange={} encrypted={}",
                ev.family.name(),
                ev.phases.initialization,
                ev.phases.handshake,
                ev.phases.key_exchange,
                ev.phases.encrypted_phase
            );
            if ev.record_header_count > 0 {
                println!("    record headers: {}", ev.record_header_count);
            }
            if !ev.keyword_hits.is_empty() {
                println!("    evidence: {}", ev.keyword_hits.join(", "));
            }
        }
    }
}

fn print_batch(batch: &PartitionBatchReport) {
    if !batch.carver_log.is_empty() {
        println!("--- carver log ---");
        for line in &batch.carver_log {
            println!("  {}", line);
        }
    }
    if batch.partitions.is_empty() {
        return;
    }
    println!("--- {} partition(s) ---", batch.partitions.len());
    for part in &batch.partitions {
        if let Some(err) = &part.error {
            println!("{}: FAILED ({})", part.path, err);
            continue;
        }
        let best = part
            .report
            .ranking
            .best()
            .map(|e| format!("{} ({})", e.label, e.score))
            .unwrap_or_else(|| "inconclusive".to_string());
        println!(
            "{}: {} bytes, entropy {:.2}, best {}",
            part.path, part.report.size, part.report.entropy, best
        );
    }
}
