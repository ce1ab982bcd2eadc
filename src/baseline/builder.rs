// Baseline construction from a recorded loudness sequence
//
// The builder runs offline, after a recording pass: it drops transient
// spikes (a door slam or static burst during recording would otherwise
// corrupt the reference), then derives whichever representation the
// deployed strategy needs - the raw trace, the smoothed trace, or the
// summary statistics.

use std::time::Duration;

use crate::audio::capture::SampleSource;
use crate::audio::volume::extract_volume;
use crate::detect::smoothing::smooth;
use crate::detect::stats::{mean, std_dev, SeriesStats};
use crate::detect::window::LoudnessSample;
use crate::error::{BaselineError, CaptureError};

/// Samples with |volume - mean| at or beyond this many standard
/// deviations are dropped as recording artifacts.
const OUTLIER_SIGMA: f64 = 10.0;

/// A raw recording pass: ordered loudness samples over a fixed span.
#[derive(Debug, Clone)]
pub struct BaselineRecording {
    pub samples: Vec<LoudnessSample>,
}

impl BaselineRecording {
    pub fn volumes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.volume).collect()
    }
}

/// Derives baseline representations from a recording.
#[derive(Debug, Clone)]
pub struct BaselineBuilder {
    min_len: usize,
    smoothing_window: usize,
    filter_outliers: bool,
}

impl BaselineBuilder {
    pub fn new(min_len: usize, smoothing_window: usize) -> Self {
        Self {
            min_len,
            smoothing_window,
            filter_outliers: true,
        }
    }

    pub fn with_outlier_filter(mut self, enabled: bool) -> Self {
        self.filter_outliers = enabled;
        self
    }

    /// Length-checked, outlier-filtered volume sequence.
    fn prepared(&self, recording: &BaselineRecording) -> Result<Vec<f64>, BaselineError> {
        if recording.samples.len() < self.min_len {
            return Err(BaselineError::InsufficientData {
                required: self.min_len,
                collected: recording.samples.len(),
            });
        }

        let volumes = recording.volumes();
        if !self.filter_outliers {
            return Ok(volumes);
        }

        let m = mean(&volumes);
        let sd = std_dev(&volumes);
        let cutoff = OUTLIER_SIGMA * sd;
        let kept: Vec<f64> = volumes
            .iter()
            .copied()
            .filter(|v| (v - m).abs() < cutoff || sd == 0.0)
            .collect();

        let dropped = volumes.len() - kept.len();
        if dropped > 0 {
            log::info!(
                "[Baseline] dropped {} outlier sample(s) beyond {} sigma",
                dropped,
                OUTLIER_SIGMA
            );
        }

        // The filter must not undercut the minimum window length
        if kept.len() < self.min_len {
            return Err(BaselineError::InsufficientData {
                required: self.min_len,
                collected: kept.len(),
            });
        }
        Ok(kept)
    }

    pub fn raw_trace(&self, recording: &BaselineRecording) -> Result<Vec<f64>, BaselineError> {
        self.prepared(recording)
    }

    pub fn smoothed_trace(
        &self,
        recording: &BaselineRecording,
    ) -> Result<Vec<f64>, BaselineError> {
        Ok(smooth(&self.prepared(recording)?, self.smoothing_window))
    }

    pub fn stats(&self, recording: &BaselineRecording) -> Result<SeriesStats, BaselineError> {
        Ok(SeriesStats::from_series(&self.prepared(recording)?))
    }
}

/// Offline recording pass: collect up to `sample_count` loudness
/// readings from a source. A source that ends early returns what was
/// collected; the builder's length check decides whether that is
/// enough. Device failure is propagated.
pub fn record_baseline(
    source: &mut dyn SampleSource,
    sample_count: usize,
    poll_interval: Duration,
) -> Result<BaselineRecording, CaptureError> {
    let mut samples = Vec::with_capacity(sample_count);
    for index in 0..sample_count as u64 {
        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(CaptureError::EndOfStream) => break,
            Err(err) => return Err(err),
        };
        let volume = extract_volume(&frame);
        log::debug!("{} | volume {:.2}", index, volume);
        samples.push(LoudnessSample { index, volume });
        std::thread::sleep(poll_interval);
    }
    log::info!("[Baseline] recorded {} samples", samples.len());
    Ok(BaselineRecording { samples })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::ScriptedSource;

    fn recording(volumes: &[f64]) -> BaselineRecording {
        BaselineRecording {
            samples: volumes
                .iter()
                .enumerate()
                .map(|(i, &volume)| LoudnessSample {
                    index: i as u64,
                    volume,
                })
                .collect(),
        }
    }

    #[test]
    fn test_insufficient_data_is_rejected() {
        let builder = BaselineBuilder::new(100, 5);
        let result = builder.raw_trace(&recording(&[5.0; 37]));
        assert_eq!(
            result,
            Err(BaselineError::InsufficientData {
                required: 100,
                collected: 37,
            })
        );
    }

    #[test]
    fn test_outlier_filter_drops_transient_spike() {
        // 400 quiet samples and one spike: the spike sits ~20 sigma out
        let mut volumes = vec![5.0; 400];
        volumes.push(405.0);

        let builder = BaselineBuilder::new(100, 5);
        let trace = builder.raw_trace(&recording(&volumes)).unwrap();
        assert_eq!(trace.len(), 400);
        assert!(trace.iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_outlier_filter_keeps_flat_recording_intact() {
        // Zero variance: nothing is an outlier
        let builder = BaselineBuilder::new(10, 5);
        let trace = builder.raw_trace(&recording(&[5.0; 20])).unwrap();
        assert_eq!(trace.len(), 20);
    }

    #[test]
    fn test_outlier_filter_can_be_disabled() {
        let mut volumes = vec![5.0; 400];
        volumes.push(405.0);

        let builder = BaselineBuilder::new(100, 5).with_outlier_filter(false);
        let trace = builder.raw_trace(&recording(&volumes)).unwrap();
        assert_eq!(trace.len(), 401);
    }

    #[test]
    fn test_smoothed_trace_preserves_length() {
        let builder = BaselineBuilder::new(10, 5);
        let rec = recording(&[5.0; 20]);
        assert_eq!(builder.smoothed_trace(&rec).unwrap().len(), 20);
    }

    #[test]
    fn test_stats_of_flat_recording() {
        let builder = BaselineBuilder::new(10, 5);
        let stats = builder.stats(&recording(&[5.0; 10])).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.trend_slope, 0.0);
        assert_eq!(stats.corr_coefficient, 0.0);
    }

    #[test]
    fn test_record_baseline_collects_requested_count() {
        let mut source = ScriptedSource::from_volumes(&[5.0; 30], 16);
        let rec = record_baseline(&mut source, 20, Duration::ZERO).unwrap();
        assert_eq!(rec.samples.len(), 20);
        assert_eq!(rec.samples[19].index, 19);
    }

    #[test]
    fn test_record_baseline_stops_at_end_of_stream() {
        let mut source = ScriptedSource::from_volumes(&[5.0; 8], 16);
        let rec = record_baseline(&mut source, 20, Duration::ZERO).unwrap();
        assert_eq!(rec.samples.len(), 8);
    }
}
