//! firmscope: static triage for firmware and raw binary blobs.
//!
//! Given a blob of unknown provenance, firmscope ranks candidate CPU
//! architectures from independent static signals (container headers, the
//! file-type tool, embedded strings, multi-architecture decode probing)
//! and infers which secure-protocol session phases the binary implements
//! from keyword and record-header evidence. Firmware images can also be
//! carved into partitions with each partition triaged separately.
//!
//! The library never executes the blob under analysis. External tools
//! and decoder backends are optional capabilities: when one is missing
//! its signal is absent and the remaining evidence still produces a
//! report.

pub mod config;
pub mod container;
pub mod disasm;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod io;
pub mod logging;
pub mod protocol;
pub mod ranker;
pub mod report;
pub mod strings;
pub mod tools;

pub use config::AnalysisConfig;
pub use engine::Engine;
pub use error::{FirmscopeError, Result};
pub use report::{AnalysisReport, PartitionBatchReport, Ranking};
