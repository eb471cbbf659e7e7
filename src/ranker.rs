//! Signal aggregation into one architecture ranking.
//!
//! Fixed additive integer weights, applied independently per signal
//! source and summed. Contribution order is fixed (container, file tool,
//! strings, protocols, disassembly) so tie-breaking by first insertion is
//! deterministic across runs.

use crate::container::ContainerInfo;
use crate::disasm::{ArchProfile, DisasmScore};
use crate::report::{ProtocolEvidence, Ranking};
use crate::strings::StringRun;

/// Weight for a recognized container machine type.
const WEIGHT_CONTAINER_MACHINE: i64 = 15;
/// Weight for a detected secure-protocol family.
const WEIGHT_PROTOCOL_PRESENT: i64 = 3;

/// All signals feeding one ranking pass. Every field may be empty or
/// absent; zero signals produce an empty (inconclusive) ranking.
#[derive(Default)]
pub struct SignalSet<'a> {
    pub container: Option<&'a ContainerInfo>,
    pub file_type: Option<&'a str>,
    pub strings: &'a [StringRun],
    pub disasm: &'a [(ArchProfile, DisasmScore)],
    pub protocols: &'a [ProtocolEvidence],
}

/// Fold all signals into a ranking.
pub fn rank(signals: &SignalSet) -> Ranking {
    let mut ranking = Ranking::new();

    if let Some(container) = signals.container {
        ranking.add(&container.ranking_label(), WEIGHT_CONTAINER_MACHINE);
    }

    if let Some(text) = signals.file_type {
        add_file_type_hints(&mut ranking, text);
    }

    for run in signals.strings {
        add_string_hints(&mut ranking, &run.text);
    }

    for evidence in signals.protocols {
        if let Some(label) = evidence.family.ranking_label() {
            ranking.add(&label, WEIGHT_PROTOCOL_PRESENT);
        }
    }

    for (profile, score) in signals.disasm {
        let contribution = score.contribution();
        if contribution > 0 {
            ranking.add(profile.label(), contribution);
        }
    }

    ranking
}

/// Coarse hints from the file-type tool's one-line classification.
/// Multiple matches each contribute independently.
fn add_file_type_hints(ranking: &mut Ranking, text: &str) {
    let low = text.to_ascii_lowercase();
    if low.contains("aarch64") {
        ranking.add("arm64", 12);
    }
    if low.contains("arm") {
        ranking.add("arm", 10);
    }
    if low.contains("mips") {
        ranking.add("mips", 10);
    }
    if low.contains("risc-v") || low.contains("riscv") {
        ranking.add("riscv", 10);
    }
    if low.contains("powerpc") || low.contains("ppc") {
        ranking.add("powerpc", 9);
    }
    if low.contains("x86-64") || low.contains("x86_64") {
        ranking.add("x86_64", 9);
    }
    if low.contains("x86") && !low.contains("64") {
        ranking.add("x86", 7);
    }
}

/// Per-string architecture keyword hits; one string may contribute to
/// several labels and a label accumulates over many strings.
fn add_string_hints(ranking: &mut Ranking, text: &str) {
    let low = text.to_ascii_lowercase();
    if low.contains("mips") {
        ranking.add("mips", 4);
    }
    if low.contains("aarch64") {
        ranking.add("arm64", 4);
    }
    if low.contains("arm") && !low.contains("aarch64") {
        ranking.add("arm", 4);
    }
    if low.contains("riscv") {
        ranking.add("riscv", 4);
    }
    if low.contains("powerpc") || low.contains("ppc") {
        ranking.add("powerpc", 4);
    }
    if low.contains("x86_64") || low.contains("x64") {
        ranking.add("x86_64", 4);
    }
    // x86 is only counted when the string carries no 64-bit marker.
    if (low.contains("i386") || low.contains("x86")) && !low.contains("64") {
        ranking.add("x86", 3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerInfo;
    use crate::report::{PhaseFlags, ProtocolFamily};
    use crate::strings::extract_strings;

    #[test]
    fn no_signals_means_empty_ranking() {
        let ranking = rank(&SignalSet::default());
        assert!(ranking.is_empty());
    }

    #[test]
    fn container_machine_scores_fifteen() {
        let mut header = vec![0u8; 20];
        header[..4].copy_from_slice(b"\x7fELF");
        header[4] = 2;
        header[5] = 1;
        header[18] = 40; // EM_ARM
        let info = ContainerInfo::parse(&header).unwrap();
        let ranking = rank(&SignalSet {
            container: Some(&info),
            ..SignalSet::default()
        });
        assert_eq!(ranking.score("elf_machine_40"), Some(15));
        assert_eq!(ranking.len(), 1);
    }

    #[test]
    fn file_tool_hints_contribute_independently() {
        let ranking = rank(&SignalSet {
            file_type: Some("ELF 64-bit LSB executable, ARM aarch64, version 1"),
            ..SignalSet::default()
        });
        assert_eq!(ranking.score("arm64"), Some(12));
        assert_eq!(ranking.score("arm"), Some(10));
        assert_eq!(ranking.score("x86"), None);
    }

    #[test]
    fn file_tool_x86_requires_no_64_marker() {
        let r32 = rank(&SignalSet {
            file_type: Some("ELF 32-bit Intel x86 executable"),
            ..SignalSet::default()
        });
        assert_eq!(r32.score("x86"), Some(7));

        let r64 = rank(&SignalSet {
            file_type: Some("ELF 64-bit x86-64 executable"),
            ..SignalSet::default()
        });
        assert_eq!(r64.score("x86_64"), Some(9));
        assert_eq!(r64.score("x86"), None);
    }

    #[test]
    fn string_hits_accumulate_per_string() {
        let data = b"\x00mips-linux-gnu\x00mipsel toolchain\x00";
        let runs = extract_strings(data, 4);
        let ranking = rank(&SignalSet {
            strings: &runs,
            ..SignalSet::default()
        });
        // two strings, +4 each
        assert_eq!(ranking.score("mips"), Some(8));
    }

    #[test]
    fn aarch64_string_does_not_count_as_arm() {
        let data = b"\x00aarch64-unknown-linux\x00";
        let runs = extract_strings(data, 4);
        let ranking = rank(&SignalSet {
            strings: &runs,
            ..SignalSet::default()
        });
        assert_eq!(ranking.score("arm64"), Some(4));
        assert_eq!(ranking.score("arm"), None);
    }

    #[test]
    fn x64_string_counts_as_x86_64_not_x86() {
        let data = b"\x00x64 build target\x00";
        let runs = extract_strings(data, 4);
        let ranking = rank(&SignalSet {
            strings: &runs,
            ..SignalSet::default()
        });
        assert_eq!(ranking.score("x86_64"), Some(4));
        assert_eq!(ranking.score("x86"), None);
    }

    #[test]
    fn named_protocols_nudge_under_namespaced_labels() {
        let protocols = vec![
            ProtocolEvidence {
                family: ProtocolFamily::Tls,
                phases: PhaseFlags::all(),
                keyword_hits: vec![],
                record_header_count: 1,
            },
            ProtocolEvidence {
                family: ProtocolFamily::GenericSecure,
                phases: PhaseFlags::all(),
                keyword_hits: vec!["nonce".into()],
                record_header_count: 0,
            },
        ];
        let ranking = rank(&SignalSet {
            protocols: &protocols,
            ..SignalSet::default()
        });
        assert_eq!(ranking.score("has_TLS"), Some(3));
        // generic fallback never touches the ranking
        assert_eq!(ranking.len(), 1);
    }

    #[test]
    fn disasm_contributions_use_profile_labels_and_skip_zeroes() {
        let disasm = vec![
            (ArchProfile::Arm64, DisasmScore::from_counts(500, 500)),
            (ArchProfile::MipsBe, DisasmScore::from_counts(0, 1)),
        ];
        let ranking = rank(&SignalSet {
            disasm: &disasm,
            ..SignalSet::default()
        });
        let expected = (1.0 * (1.0 + 501f64.ln()) * 10.0).floor() as i64;
        assert_eq!(ranking.score("arm64"), Some(expected));
        assert_eq!(ranking.score("mips_be"), None);
    }

    #[test]
    fn labels_stay_within_vocabulary() {
        let data = b"\x00aarch64 mips riscv powerpc x86_64 i386\x00";
        let runs = extract_strings(data, 4);
        let ranking = rank(&SignalSet {
            strings: &runs,
            file_type: Some("ARM aarch64 mips risc-v powerpc x86-64"),
            ..SignalSet::default()
        });
        let allowed = [
            "x86", "x86_64", "arm", "arm_le", "arm_be", "arm64", "mips", "mips_le", "mips_be",
            "riscv", "powerpc", "ppc",
        ];
        for entry in ranking.ranked() {
            assert!(
                allowed.contains(&entry.label.as_str())
                    || entry.label.starts_with("elf_machine_")
                    || entry.label.starts_with("has_"),
                "unexpected label {}",
                entry.label
            );
        }
    }
}
