// Volume extraction - frame to loudness scalar

/// Mean absolute amplitude of a frame of signed 16-bit samples.
///
/// This is the single loudness figure the whole pipeline runs on.
/// Pure function; an empty frame yields 0.0.
#[inline]
pub fn extract_volume(frame: &[i16]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f64 = frame.iter().map(|&s| (s as f64).abs()).sum();
    sum / frame.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_absolute_amplitude() {
        // Signs must not cancel
        let frame = [100_i16, -100, 50, -50];
        assert_eq!(extract_volume(&frame), 75.0);
    }

    #[test]
    fn test_constant_frame() {
        let frame = [5_i16; 1024];
        assert_eq!(extract_volume(&frame), 5.0);
    }

    #[test]
    fn test_silence_is_zero() {
        let frame = [0_i16; 256];
        assert_eq!(extract_volume(&frame), 0.0);
    }

    #[test]
    fn test_empty_frame_returns_zero() {
        assert_eq!(extract_volume(&[]), 0.0);
    }

    #[test]
    fn test_extreme_amplitudes_do_not_overflow() {
        let frame = [i16::MIN, i16::MAX];
        let expected = (32768.0 + 32767.0) / 2.0;
        assert_eq!(extract_volume(&frame), expected);
    }
}
