//! Byte statistics: Shannon entropy over whole blobs and fixed windows.

/// Shannon entropy of a byte slice, in bits per byte ([0, 8]).
///
/// Empty input yields 0.0.
#[inline]
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut hist = [0usize; 256];
    for &b in data {
        hist[b as usize] += 1;
    }
    let len = data.len() as f64;
    let mut h = 0.0;
    for c in hist.iter().copied() {
        if c == 0 {
            continue;
        }
        let p = (c as f64) / len;
        h -= p * p.log2();
    }
    h
}

/// Entropy of non-overlapping fixed-size windows.
///
/// The final partial window is included when non-empty. Consumed only as
/// an aggregate feature (see [`mean`]); raw windows are never reported.
pub fn windowed_entropy(data: &[u8], window: usize) -> Vec<f64> {
    if data.is_empty() || window == 0 {
        return Vec::new();
    }
    data.chunks(window).map(shannon_entropy).collect()
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_empty_is_zero() {
        assert_eq!(shannon_entropy(&[]), 0.0);
    }

    #[test]
    fn entropy_of_constant_buffer_is_exactly_zero() {
        for len in [1usize, 7, 4096] {
            let data = vec![0x41u8; len];
            assert_eq!(shannon_entropy(&data), 0.0, "len={}", len);
        }
        let zeros = vec![0u8; 1024];
        assert_eq!(shannon_entropy(&zeros), 0.0);
    }

    #[test]
    fn entropy_of_full_byte_range_is_exactly_eight() {
        let data: Vec<u8> = (0u16..256).map(|b| b as u8).collect();
        let h = shannon_entropy(&data);
        assert!((h - 8.0).abs() < 1e-12, "entropy was {}", h);
    }

    #[test]
    fn windowed_entropy_includes_partial_tail() {
        let data = vec![0u8; 10];
        let windows = windowed_entropy(&data, 4);
        // 4 + 4 + 2
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|&h| h == 0.0));
    }

    #[test]
    fn windowed_entropy_empty_or_zero_window() {
        assert!(windowed_entropy(&[], 8).is_empty());
        assert!(windowed_entropy(&[1, 2, 3], 0).is_empty());
    }

    #[test]
    fn mean_of_windows() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }
}
