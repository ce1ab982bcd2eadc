// Similarity scoring strategies
//
// Four interchangeable ways to decide whether the current window of
// loudness values matches the recorded baseline, selected by
// configuration. Every scorer consumes a full window (the pipeline
// gates on window capacity, so `window.len() == N` holds) and produces
// a scalar score plus a Match/NoMatch decision. None of them mutate
// shared state; ThresholdHysteresis keeps a private latch, which is
// why `score` takes `&mut self`.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::baseline::BaselineProfile;
use crate::config::{DetectionConfig, Strategy};
use crate::detect::smoothing::smooth;
use crate::detect::state_machine::Decision;
use crate::detect::stats::{pearson, SeriesStats};
use crate::error::ConfigError;

/// Scalar score in a strategy-defined range, plus the decision the
/// state machine consumes. The score is informational (logged and
/// attached to RingStarted events).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScore {
    pub value: f64,
    pub decision: Decision,
}

impl SimilarityScore {
    fn new(value: f64, is_match: bool) -> Self {
        Self {
            value,
            decision: if is_match {
                Decision::Match
            } else {
                Decision::NoMatch
            },
        }
    }
}

/// Strategy interface: current window in, score out.
pub trait SimilarityScorer: Send {
    fn score(&mut self, window: &[f64]) -> SimilarityScore;
}

/// Raw instantaneous amplitude against distinct enter/exit thresholds.
///
/// Cheap and baseline-free, but any loud noise triggers it. The latch
/// holds the match between crossing the enter threshold and falling
/// back to the exit threshold.
pub struct ThresholdHysteresis {
    enter_threshold: f64,
    exit_threshold: f64,
    engaged: bool,
}

impl ThresholdHysteresis {
    pub fn new(enter_threshold: f64, exit_threshold: f64) -> Self {
        debug_assert!(enter_threshold > exit_threshold);
        Self {
            enter_threshold,
            exit_threshold,
            engaged: false,
        }
    }
}

impl SimilarityScorer for ThresholdHysteresis {
    fn score(&mut self, window: &[f64]) -> SimilarityScore {
        let volume = window.last().copied().unwrap_or(0.0);
        if self.engaged {
            if volume <= self.exit_threshold {
                self.engaged = false;
            }
        } else if volume > self.enter_threshold {
            self.engaged = true;
        }
        SimilarityScore::new(volume, self.engaged)
    }
}

/// Pearson correlation between the smoothed live window and the
/// smoothed baseline trace. Score range [-1, 1].
pub struct CorrelationMatch {
    baseline: Vec<f64>,
    smoothing_window: usize,
    threshold: f64,
}

impl CorrelationMatch {
    /// `baseline_trace` is smoothed here with the same window that will
    /// be applied to the live signal.
    pub fn new(baseline_trace: &[f64], smoothing_window: usize, threshold: f64) -> Self {
        Self {
            baseline: smooth(baseline_trace, smoothing_window),
            smoothing_window,
            threshold,
        }
    }
}

impl SimilarityScorer for CorrelationMatch {
    fn score(&mut self, window: &[f64]) -> SimilarityScore {
        let smoothed = smooth(window, self.smoothing_window);
        let corr = pearson(&smoothed, &self.baseline);
        SimilarityScore::new(corr, corr >= self.threshold)
    }
}

/// Window summary statistics within tolerances of the baseline stats.
///
/// All four deltas are compared symmetrically with `abs() < tol`, so a
/// window that is too loud is rejected just like one that is too quiet.
pub struct MomentTrendMatch {
    baseline: SeriesStats,
    mean_tolerance: f64,
    std_tolerance: f64,
    trend_tolerance: f64,
    corr_tolerance: f64,
}

impl MomentTrendMatch {
    pub fn new(
        baseline: SeriesStats,
        mean_tolerance: f64,
        std_tolerance: f64,
        trend_tolerance: f64,
        corr_tolerance: f64,
    ) -> Self {
        Self {
            baseline,
            mean_tolerance,
            std_tolerance,
            trend_tolerance,
            corr_tolerance,
        }
    }
}

impl SimilarityScorer for MomentTrendMatch {
    fn score(&mut self, window: &[f64]) -> SimilarityScore {
        let live = SeriesStats::from_series(window);

        // Largest tolerance-normalized delta; < 1.0 means all four are
        // within tolerance.
        let worst = [
            (live.mean - self.baseline.mean).abs() / self.mean_tolerance,
            (live.std_dev - self.baseline.std_dev).abs() / self.std_tolerance,
            (live.trend_slope - self.baseline.trend_slope).abs() / self.trend_tolerance,
            (live.corr_coefficient - self.baseline.corr_coefficient).abs() / self.corr_tolerance,
        ]
        .into_iter()
        .fold(0.0_f64, f64::max);

        SimilarityScore::new(worst, worst < 1.0)
    }
}

/// Lowest qualifying peak of the window's magnitude spectrum.
///
/// Targets the doorbell's characteristic tone independent of the
/// ambient noise floor: the raw window is transformed with a forward
/// DFT, local maxima above `peak_threshold` are collected (the DC bin
/// is excluded), and the window matches when the lowest-frequency
/// qualifying peak sits at or above `freq_threshold_bin`.
pub struct FrequencyPeakMatch {
    planner: FftPlanner<f64>,
    peak_threshold: f64,
    freq_threshold_bin: usize,
}

impl FrequencyPeakMatch {
    pub fn new(peak_threshold: f64, freq_threshold_bin: usize) -> Self {
        Self {
            planner: FftPlanner::new(),
            peak_threshold,
            freq_threshold_bin,
        }
    }

    /// Magnitude spectrum over the positive-frequency bins 0..=N/2.
    fn magnitude_spectrum(&mut self, window: &[f64]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> =
            window.iter().map(|&v| Complex::new(v, 0.0)).collect();
        let fft = self.planner.plan_fft_forward(window.len());
        fft.process(&mut buffer);
        buffer[..window.len() / 2 + 1]
            .iter()
            .map(|c| c.norm())
            .collect()
    }
}

impl SimilarityScorer for FrequencyPeakMatch {
    fn score(&mut self, window: &[f64]) -> SimilarityScore {
        let spectrum = self.magnitude_spectrum(window);

        // Lowest-frequency local maximum above the peak threshold,
        // skipping bin 0 (DC carries the mean amplitude).
        let lowest_peak = (1..spectrum.len().saturating_sub(1)).find(|&i| {
            spectrum[i] > self.peak_threshold
                && spectrum[i] > spectrum[i - 1]
                && spectrum[i] > spectrum[i + 1]
        });

        match lowest_peak {
            Some(bin) => SimilarityScore::new(bin as f64, bin >= self.freq_threshold_bin),
            None => SimilarityScore::new(0.0, false),
        }
    }
}

/// Build the configured scorer against the loaded baseline profile.
pub fn build_scorer(
    config: &DetectionConfig,
    baseline: &BaselineProfile,
) -> Result<Box<dyn SimilarityScorer>, ConfigError> {
    match config.strategy {
        Strategy::ThresholdHysteresis => Ok(Box::new(ThresholdHysteresis::new(
            config.enter_threshold,
            config.exit_threshold,
        ))),
        Strategy::CorrelationMatch => match baseline {
            BaselineProfile::Trace(trace) => Ok(Box::new(CorrelationMatch::new(
                trace,
                config.smoothing_window,
                config.correlation_threshold,
            ))),
            BaselineProfile::Stats(_) => Err(ConfigError::InvalidValue {
                field: "detection.strategy".to_string(),
                reason: "correlation_match requires a trace baseline, got stats".to_string(),
            }),
        },
        Strategy::MomentTrendMatch => {
            let stats = match baseline {
                BaselineProfile::Stats(stats) => *stats,
                // A trace baseline works too; reduce it to stats here.
                BaselineProfile::Trace(trace) => SeriesStats::from_series(trace),
            };
            Ok(Box::new(MomentTrendMatch::new(
                stats,
                config.mean_tolerance,
                config.std_tolerance,
                config.trend_tolerance,
                config.corr_tolerance,
            )))
        }
        Strategy::FrequencyPeakMatch => Ok(Box::new(FrequencyPeakMatch::new(
            config.peak_threshold,
            config.freq_threshold_bin,
        ))),
    }
}
