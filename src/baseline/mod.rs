// Baseline profiles
//
// A baseline is the reference loudness pattern of a known doorbell
// ring, recorded once offline and loaded at startup. It is immutable
// after construction and shared read-only by all scorer invocations,
// so no locking is ever needed. Two representations exist: an ordered
// trace of N reference volumes (raw or smoothed) for shape comparison,
// and the four summary statistics for moment/trend comparison.

pub mod builder;
pub mod store;

use crate::detect::stats::SeriesStats;
use crate::error::BaselineError;

pub use builder::{record_baseline, BaselineBuilder, BaselineRecording};

/// A loaded reference pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum BaselineProfile {
    /// Ordered sequence of reference volumes, oldest first
    Trace(Vec<f64>),
    /// Summary statistics of the recorded sequence
    Stats(SeriesStats),
}

impl BaselineProfile {
    /// The rolling-window capacity this profile implies.
    pub fn window_len(&self) -> usize {
        match self {
            BaselineProfile::Trace(trace) => trace.len(),
            BaselineProfile::Stats(stats) => stats.len,
        }
    }

    /// Startup check that the profile covers at least the configured
    /// minimum window length.
    pub fn require_min_len(&self, required: usize) -> Result<(), BaselineError> {
        let collected = self.window_len();
        if collected < required {
            return Err(BaselineError::InsufficientData {
                required,
                collected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_len_for_both_representations() {
        assert_eq!(BaselineProfile::Trace(vec![1.0; 42]).window_len(), 42);
        let stats = SeriesStats::from_series(&[5.0; 17]);
        assert_eq!(BaselineProfile::Stats(stats).window_len(), 17);
    }

    #[test]
    fn test_require_min_len() {
        let profile = BaselineProfile::Trace(vec![1.0; 50]);
        assert!(profile.require_min_len(50).is_ok());
        assert_eq!(
            profile.require_min_len(51),
            Err(BaselineError::InsufficientData {
                required: 51,
                collected: 50,
            })
        );
    }
}
