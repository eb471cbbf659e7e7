//! Disassembly plausibility scoring.
//!
//! Each fixed architecture profile attempts a linear decode of a capped
//! blob prefix; real machine code for the right architecture decodes as a
//! long, dense run, while a wrong-architecture interpretation usually dies
//! on an illegal opcode early. The score rewards both decode density and
//! absolute run length.
//!
//! x86/x86_64 decode through iced-x86; everything else through capstone.
//! One profile's fault never affects the others.

use capstone::{Arch as CsArch, Capstone, Endian, Mode, NO_EXTRA_MODE};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// Fixed architecture/mode/endianness configurations to probe.
///
/// New configurations are added as variants, never by branching on label
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchProfile {
    X86,
    X86_64,
    ArmLe,
    ArmBe,
    Arm64,
    MipsLe,
    MipsBe,
    Ppc,
    Riscv,
}

impl ArchProfile {
    pub const ALL: [ArchProfile; 9] = [
        ArchProfile::X86,
        ArchProfile::X86_64,
        ArchProfile::ArmLe,
        ArchProfile::ArmBe,
        ArchProfile::Arm64,
        ArchProfile::MipsLe,
        ArchProfile::MipsBe,
        ArchProfile::Ppc,
        ArchProfile::Riscv,
    ];

    /// Label this profile contributes to the ranking.
    pub fn label(&self) -> &'static str {
        match self {
            ArchProfile::X86 => "x86",
            ArchProfile::X86_64 => "x86_64",
            ArchProfile::ArmLe => "arm_le",
            ArchProfile::ArmBe => "arm_be",
            ArchProfile::Arm64 => "arm64",
            ArchProfile::MipsLe => "mips_le",
            ArchProfile::MipsBe => "mips_be",
            ArchProfile::Ppc => "ppc",
            ArchProfile::Riscv => "riscv",
        }
    }

    /// Capstone configuration; `None` for the iced-x86 profiles.
    fn capstone_spec(&self) -> Option<(CsArch, Mode, Option<Endian>)> {
        match self {
            ArchProfile::X86 | ArchProfile::X86_64 => None,
            ArchProfile::ArmLe => Some((CsArch::ARM, Mode::Arm, Some(Endian::Little))),
            ArchProfile::ArmBe => Some((CsArch::ARM, Mode::Arm, Some(Endian::Big))),
            ArchProfile::Arm64 => Some((CsArch::ARM64, Mode::Arm, Some(Endian::Little))),
            ArchProfile::MipsLe => Some((CsArch::MIPS, Mode::Mips32, Some(Endian::Little))),
            ArchProfile::MipsBe => Some((CsArch::MIPS, Mode::Mips32, Some(Endian::Big))),
            ArchProfile::Ppc => Some((CsArch::PPC, Mode::Mode32, Some(Endian::Big))),
            ArchProfile::Riscv => Some((CsArch::RISCV, Mode::RiscV64, None)),
        }
    }
}

/// Outcome of one profile's linear decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DisasmScore {
    pub valid_ratio: f64,
    pub valid_count: usize,
    pub total: usize,
}

impl DisasmScore {
    pub fn from_counts(valid_count: usize, total: usize) -> Self {
        let valid_ratio = if total == 0 {
            0.0
        } else {
            valid_count as f64 / total as f64
        };
        Self {
            valid_ratio,
            valid_count,
            total,
        }
    }

    /// Ranking contribution: `floor(ratio * (1 + ln(1 + valid)) * 10)`.
    pub fn contribution(&self) -> i64 {
        (self.valid_ratio * (1.0 + (1.0 + self.valid_count as f64).ln()) * 10.0).floor() as i64
    }
}

/// Capability interface for multi-architecture decode probing. The engine
/// treats an absent implementation as "no disassembly signal"; stub
/// implementations make the pipeline testable without decoder libraries.
pub trait PlausibilityEngine: Send + Sync {
    /// Score every profile over a capped prefix of `data`. Profiles whose
    /// decoder cannot be constructed are omitted, not zero-filled.
    fn score(&self, data: &[u8], max_prefix: usize) -> Vec<(ArchProfile, DisasmScore)>;
}

/// Default engine backed by iced-x86 and capstone.
#[derive(Debug, Default)]
pub struct DecoderBank;

impl PlausibilityEngine for DecoderBank {
    fn score(&self, data: &[u8], max_prefix: usize) -> Vec<(ArchProfile, DisasmScore)> {
        let prefix = &data[..data.len().min(max_prefix)];
        // Independent per profile; rayon preserves output order on collect.
        ArchProfile::ALL
            .par_iter()
            .filter_map(|&profile| {
                match catch_unwind(AssertUnwindSafe(|| probe_profile(profile, prefix))) {
                    Ok(Some(score)) => Some((profile, score)),
                    Ok(None) => {
                        warn!(profile = profile.label(), "decoder unavailable; profile skipped");
                        None
                    }
                    Err(_) => {
                        warn!(profile = profile.label(), "decoder panicked; profile skipped");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Linear decode from offset 0 until the first failure or prefix end.
/// A terminal decode failure counts toward `total` but not `valid_count`,
/// so a fully decoded prefix scores ratio 1.0 and a run that dies on an
/// illegal opcode scores below it.
fn probe_profile(profile: ArchProfile, prefix: &[u8]) -> Option<DisasmScore> {
    if prefix.is_empty() {
        return Some(DisasmScore::from_counts(0, 0));
    }
    match profile {
        ArchProfile::X86 => Some(probe_iced(32, prefix)),
        ArchProfile::X86_64 => Some(probe_iced(64, prefix)),
        _ => probe_capstone(profile, prefix),
    }
}

fn probe_iced(bitness: u32, prefix: &[u8]) -> DisasmScore {
    use iced_x86::{Decoder, DecoderOptions};

    let mut decoder = Decoder::new(bitness, prefix, DecoderOptions::NONE);
    let mut valid = 0usize;
    let mut total = 0usize;
    while decoder.can_decode() {
        let instr = decoder.decode();
        total += 1;
        if instr.is_invalid() {
            break;
        }
        valid += 1;
    }
    DisasmScore::from_counts(valid, total)
}

fn probe_capstone(profile: ArchProfile, prefix: &[u8]) -> Option<DisasmScore> {
    let (arch, mode, endian) = profile.capstone_spec()?;
    // Construction failure means the capability is absent for this profile.
    let cs = Capstone::new_raw(arch, mode, NO_EXTRA_MODE, endian).ok()?;
    let insns = match cs.disasm_all(prefix, 0) {
        Ok(insns) => insns,
        // Engine-level decode error: no bytes attempted for this profile.
        Err(_) => return Some(DisasmScore::from_counts(0, 0)),
    };
    let valid = insns.len();
    let consumed: usize = insns.iter().map(|i| i.bytes().len()).sum();
    // capstone stops silently at the first undecodable instruction; if it
    // did not consume the whole prefix, that stop was a failed attempt.
    let total = if consumed < prefix.len() { valid + 1 } else { valid };
    Some(DisasmScore::from_counts(valid, total))
}
