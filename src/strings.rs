//! Printable-ASCII string extraction.

use serde::{Deserialize, Serialize};

/// A contiguous printable-ASCII run found in a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringRun {
    /// Byte offset of the first character in the blob.
    pub offset: usize,
    pub text: String,
}

/// Aggregate string statistics carried in the analysis report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringsSummary {
    pub count: usize,
    pub avg_len: f64,
    /// Case-insensitive "gcc" marker anywhere in the string set; a cheap
    /// toolchain hint.
    pub toolchain_gcc: bool,
}

#[inline]
fn is_printable(b: u8) -> bool {
    (0x20..=0x7E).contains(&b)
}

/// Extract all printable-ASCII runs of at least `min_len` bytes.
///
/// Runs shorter than `min_len` are discarded entirely, never truncated.
/// Order follows the first-to-last byte order of the blob; duplicates are
/// kept. Single pass, no allocation beyond the output.
pub fn extract_strings(data: &[u8], min_len: usize) -> Vec<StringRun> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &b) in data.iter().enumerate() {
        if is_printable(b) {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            if i - s >= min_len {
                runs.push(StringRun {
                    offset: s,
                    text: String::from_utf8_lossy(&data[s..i]).into_owned(),
                });
            }
        }
    }
    if let Some(s) = start {
        if data.len() - s >= min_len {
            runs.push(StringRun {
                offset: s,
                text: String::from_utf8_lossy(&data[s..]).into_owned(),
            });
        }
    }
    runs
}

/// Summarize an extracted string set.
pub fn summarize(runs: &[StringRun]) -> StringsSummary {
    let count = runs.len();
    let avg_len = if count == 0 {
        0.0
    } else {
        runs.iter().map(|r| r.text.len()).sum::<usize>() as f64 / count as f64
    };
    let toolchain_gcc = runs
        .iter()
        .any(|r| r.text.to_ascii_lowercase().contains("gcc"));
    StringsSummary {
        count,
        avg_len,
        toolchain_gcc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_runs_in_order_with_offsets() {
        let data = b"\x00abcd\x01\x02hello world\xffzz";
        let runs = extract_strings(data, 4);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "abcd");
        assert_eq!(runs[0].offset, 1);
        assert_eq!(runs[1].text, "hello world");
        assert_eq!(runs[1].offset, 7);
    }

    #[test]
    fn short_runs_are_discarded_not_truncated() {
        let data = b"ab\x00abc\x00abcd";
        let runs = extract_strings(data, 4);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "abcd");
    }

    #[test]
    fn trailing_run_is_kept() {
        let data = b"\x00\x01trailing";
        let runs = extract_strings(data, 4);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "trailing");
        assert_eq!(runs[0].offset, 2);
    }

    #[test]
    fn no_run_shorter_than_min_len() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        for run in extract_strings(&data, 6) {
            assert!(run.text.len() >= 6);
        }
    }

    #[test]
    fn reconstruction_is_consistent_with_single_scan() {
        // Concatenating runs with their gaps reinserted must reproduce the
        // printable regions of the original scan.
        let data = b"one\x00four\x07fivesix\x00ab";
        let runs = extract_strings(data, 4);
        for run in &runs {
            let slice = &data[run.offset..run.offset + run.text.len()];
            assert_eq!(slice, run.text.as_bytes());
            // Runs are maximal: neighbors are non-printable or boundaries.
            if run.offset > 0 {
                assert!(!(0x20..=0x7E).contains(&data[run.offset - 1]));
            }
            let end = run.offset + run.text.len();
            if end < data.len() {
                assert!(!(0x20..=0x7E).contains(&data[end]));
            }
        }
    }

    #[test]
    fn summary_counts_and_gcc_hint() {
        let runs = extract_strings(b"GCC: (GNU) 9.4.0\x00mips-linux", 4);
        let summary = summarize(&runs);
        assert_eq!(summary.count, 2);
        assert!(summary.toolchain_gcc);
        assert!(summary.avg_len > 0.0);

        assert_eq!(summarize(&[]).count, 0);
        assert_eq!(summarize(&[]).avg_len, 0.0);
    }
}
