// Centered moving-average smoothing
//
// Denoises a loudness sequence before correlation scoring. The average
// window shrinks near the boundaries instead of padding, so the output
// always has the same length as the input.

/// Edge-truncated centered moving average.
///
/// For index i the average covers
/// `[max(0, i - window_size/2), min(len, i + window_size/2 + 1))`.
/// Deterministic and pure. `window_size == 0` is a caller contract
/// violation.
pub fn smooth(values: &[f64], window_size: usize) -> Vec<f64> {
    debug_assert!(window_size > 0, "smoothing window must be greater than 0");
    let half = window_size / 2;
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(values.len());
            let span = &values[start..end];
            span.iter().sum::<f64>() / span.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_is_preserved() {
        for len in [1, 2, 5, 100] {
            let values: Vec<f64> = (0..len).map(|i| i as f64).collect();
            for w in [1, 3, 5, 9] {
                assert_eq!(smooth(&values, w).len(), len);
            }
        }
    }

    #[test]
    fn test_constant_sequence_is_fixed_point() {
        let values = vec![7.5; 20];
        assert_eq!(smooth(&values, 5), values);
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let values = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(smooth(&values, 1), values);
    }

    #[test]
    fn test_centered_average_interior() {
        let values = vec![0.0, 3.0, 6.0, 9.0, 12.0];
        let smoothed = smooth(&values, 3);
        // Interior points average their neighbors
        assert_eq!(smoothed[1], 3.0);
        assert_eq!(smoothed[2], 6.0);
        assert_eq!(smoothed[3], 9.0);
    }

    #[test]
    fn test_edges_truncate_instead_of_padding() {
        let values = vec![0.0, 3.0, 6.0, 9.0, 12.0];
        let smoothed = smooth(&values, 3);
        // First point averages only [0, 3], last only [9, 12]
        assert_eq!(smoothed[0], 1.5);
        assert_eq!(smoothed[4], 10.5);
    }

    #[test]
    fn test_empty_input() {
        assert!(smooth(&[], 3).is_empty());
    }
}
