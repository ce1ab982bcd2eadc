// Configuration for capture and detection
//
// Runtime parameters are loaded from a JSON file so thresholds and the
// scoring strategy can be tuned without recompilation. Every section
// has defaults, but a file that exists and fails to read, parse or
// validate is a fatal startup error: a detector running with half a
// config would silently mis-detect.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
}

/// Audio capture parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Samples per frame handed to the volume extractor
    pub frame_size: usize,
    /// Input channel count; only the first channel is analyzed
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Sleep between detection loop iterations, in milliseconds
    pub poll_interval_ms: u64,
    /// Capacity of the capture-to-detection frame queue
    pub queue_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            channels: 1,
            sample_rate: 44100,
            poll_interval_ms: 1,
            queue_capacity: 64,
        }
    }
}

/// Scoring strategy selected for a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Raw amplitude with distinct enter/exit thresholds
    ThresholdHysteresis,
    /// Pearson correlation of the smoothed window against the smoothed
    /// baseline trace
    CorrelationMatch,
    /// Window summary statistics within tolerances of the baseline stats
    MomentTrendMatch,
    /// Lowest qualifying peak of the window magnitude spectrum
    FrequencyPeakMatch,
}

/// Detection pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub strategy: Strategy,
    /// Minimum baseline length in samples; the rolling window capacity
    /// equals the loaded baseline length
    pub window_size: usize,
    /// Moving-average width for the smoother
    pub smoothing_window: usize,
    /// ThresholdHysteresis: amplitude above which a ring candidate starts
    pub enter_threshold: f64,
    /// ThresholdHysteresis: amplitude at or below which it releases
    pub exit_threshold: f64,
    /// CorrelationMatch: minimum Pearson correlation for a match
    pub correlation_threshold: f64,
    /// MomentTrendMatch tolerances, compared against |live - baseline|
    pub mean_tolerance: f64,
    pub std_tolerance: f64,
    pub trend_tolerance: f64,
    pub corr_tolerance: f64,
    /// FrequencyPeakMatch: magnitude a spectrum peak must exceed
    pub peak_threshold: f64,
    /// FrequencyPeakMatch: spectrum bin the lowest qualifying peak must
    /// reach for a match
    pub freq_threshold_bin: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::CorrelationMatch,
            window_size: 200,
            smoothing_window: 5,
            enter_threshold: 50.0,
            exit_threshold: 20.0,
            correlation_threshold: 0.9,
            mean_tolerance: 0.8,
            std_tolerance: 5.0,
            trend_tolerance: 0.1,
            corr_tolerance: 0.1,
            peak_threshold: 1000.0,
            freq_threshold_bin: 5,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let config: AppConfig =
            serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        config.validate()?;
        log::info!("[Config] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Startup validation. Every check here guards an assumption the
    /// pipeline relies on at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &str, reason: &str) -> ConfigError {
            ConfigError::InvalidValue {
                field: field.to_string(),
                reason: reason.to_string(),
            }
        }

        if self.audio.frame_size == 0 {
            return Err(invalid("audio.frame_size", "must be greater than 0"));
        }
        if self.audio.channels == 0 {
            return Err(invalid("audio.channels", "must be greater than 0"));
        }
        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", "must be greater than 0"));
        }
        if self.audio.queue_capacity == 0 {
            return Err(invalid("audio.queue_capacity", "must be greater than 0"));
        }
        if self.detection.window_size < 2 {
            return Err(invalid("detection.window_size", "must be at least 2"));
        }
        if self.detection.smoothing_window == 0 {
            return Err(invalid(
                "detection.smoothing_window",
                "must be greater than 0",
            ));
        }
        if self.detection.enter_threshold <= self.detection.exit_threshold {
            return Err(invalid(
                "detection.enter_threshold",
                "must exceed exit_threshold",
            ));
        }
        if !(-1.0..=1.0).contains(&self.detection.correlation_threshold) {
            return Err(invalid(
                "detection.correlation_threshold",
                "must be within [-1, 1]",
            ));
        }
        for (field, value) in [
            ("detection.mean_tolerance", self.detection.mean_tolerance),
            ("detection.std_tolerance", self.detection.std_tolerance),
            ("detection.trend_tolerance", self.detection.trend_tolerance),
            ("detection.corr_tolerance", self.detection.corr_tolerance),
        ] {
            if value <= 0.0 {
                return Err(invalid(field, "must be greater than 0"));
            }
        }
        if self.detection.freq_threshold_bin > self.detection.window_size / 2 {
            return Err(invalid(
                "detection.freq_threshold_bin",
                "exceeds the highest spectrum bin (window_size / 2)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.frame_size, 1024);
        assert_eq!(config.detection.strategy, Strategy::CorrelationMatch);
        assert_eq!(config.detection.window_size, 200);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.detection.strategy, config.detection.strategy);
        assert_eq!(
            parsed.detection.correlation_threshold,
            config.detection.correlation_threshold
        );
        assert_eq!(parsed.audio.sample_rate, config.audio.sample_rate);
    }

    #[test]
    fn test_strategy_names_are_snake_case() {
        let json = serde_json::to_string(&Strategy::MomentTrendMatch).unwrap();
        assert_eq!(json, "\"moment_trend_match\"");
        let parsed: Strategy = serde_json::from_str("\"frequency_peak_match\"").unwrap();
        assert_eq!(parsed, Strategy::FrequencyPeakMatch);
    }

    #[test]
    fn test_partial_config_uses_section_defaults() {
        let parsed: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.audio.frame_size, 1024);
        assert_eq!(parsed.detection.enter_threshold, 50.0);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = AppConfig::default();
        config.detection.enter_threshold = 10.0;
        config.detection.exit_threshold = 20.0;
        match config.validate().unwrap_err() {
            ConfigError::InvalidValue { field, .. } => {
                assert_eq!(field, "detection.enter_threshold");
            }
            e => panic!("Expected InvalidValue, got: {:?}", e),
        }
    }

    #[test]
    fn test_validate_rejects_zero_smoothing_window() {
        let mut config = AppConfig::default();
        config.detection.smoothing_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_correlation() {
        let mut config = AppConfig::default();
        config.detection.correlation_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_peak_bin_past_spectrum_end() {
        let mut config = AppConfig::default();
        config.detection.window_size = 10;
        config.detection.freq_threshold_bin = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_is_fatal() {
        let result = AppConfig::load_from_file("/nonexistent/ringwatch.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
