// Detection pipeline and poll loop
//
// RingDetector owns the rolling window, the configured scorer and the
// state machine; `process_frame` advances all three by one frame.
// `run_loop` drives a SampleSource through the detector on a single
// thread: pop a frame, extract volume, update the window, score, step
// the state machine, sleep, repeat. The blocking frame read is the
// only suspension point; overrun monitoring is an external concern.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::audio::capture::SampleSource;
use crate::audio::volume::extract_volume;
use crate::baseline::BaselineProfile;
use crate::config::DetectionConfig;
use crate::detect::scorer::{build_scorer, SimilarityScorer};
use crate::detect::state_machine::{RingEvent, RingState, RingStateMachine};
use crate::detect::window::{LoudnessSample, RollingWindow};
use crate::error::{CaptureError, ConfigError};

pub struct RingDetector {
    window: RollingWindow,
    scorer: Box<dyn SimilarityScorer>,
    machine: RingStateMachine,
    next_index: u64,
}

impl RingDetector {
    /// The window capacity is the length of the loaded baseline.
    pub fn new(window_len: usize, scorer: Box<dyn SimilarityScorer>) -> Self {
        Self {
            window: RollingWindow::new(window_len),
            scorer,
            machine: RingStateMachine::new(),
            next_index: 0,
        }
    }

    pub fn from_config(
        config: &DetectionConfig,
        baseline: &BaselineProfile,
    ) -> Result<Self, ConfigError> {
        let scorer = build_scorer(config, baseline)?;
        Ok(Self::new(baseline.window_len(), scorer))
    }

    /// Fill the window with a constant volume, skipping the cold-start
    /// grace period. Deployments that seed the window with the first
    /// live reading use this; the default is the strict N-sample wait.
    pub fn prefill(&mut self, volume: f64) {
        while !self.window.is_full() {
            self.window.push(LoudnessSample {
                index: self.next_index,
                volume,
            });
            self.next_index += 1;
        }
    }

    /// Advance the pipeline by one captured frame. Returns a ring event
    /// when the state machine transitions. Until the window first
    /// reaches capacity no score is computed and the state stays Idle,
    /// regardless of input amplitude.
    pub fn process_frame(&mut self, frame: &[i16]) -> Option<RingEvent> {
        let index = self.next_index;
        self.next_index += 1;

        let volume = extract_volume(frame);
        log::debug!("{} | volume {:.2}", index, volume);

        self.window.push(LoudnessSample { index, volume });
        if !self.window.is_full() {
            return None;
        }

        let score = self.scorer.score(&self.window.volumes());
        self.machine.step(score.decision, index, score.value)
    }

    pub fn state(&self) -> RingState {
        self.machine.state()
    }

    pub fn samples_seen(&self) -> u64 {
        self.next_index
    }
}

/// Run the detection loop until the source ends or fails.
///
/// Transitions are logged and sent to the broadcast channel; a send
/// with no live receivers is not an error. A `CaptureError` other than
/// `EndOfStream` is fatal and propagated for the caller's
/// shutdown/restart decision.
pub fn run_loop(
    source: &mut dyn SampleSource,
    detector: &mut RingDetector,
    events: &broadcast::Sender<RingEvent>,
    poll_interval: Duration,
) -> Result<(), CaptureError> {
    loop {
        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(CaptureError::EndOfStream) => {
                log::info!("[Detect] sample source ended after {} frames", detector.samples_seen());
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if let Some(event) = detector.process_frame(&frame) {
            match event {
                RingEvent::Started { index, score } => {
                    log::info!("[Detect] ring started at {} (score {:.3})", index, score)
                }
                RingEvent::Stopped { index } => {
                    log::info!("[Detect] ring stopped at {}", index)
                }
            }
            let _ = events.send(event);
        }

        std::thread::sleep(poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::ScriptedSource;
    use crate::config::Strategy;
    use crate::detect::stats::SeriesStats;

    fn config_with(strategy: Strategy) -> DetectionConfig {
        DetectionConfig {
            strategy,
            window_size: 10,
            freq_threshold_bin: 4,
            ..DetectionConfig::default()
        }
    }

    fn constant_frame(volume: f64) -> Vec<i16> {
        vec![volume.round() as i16; 64]
    }

    #[test]
    fn test_cold_start_holds_idle_for_every_strategy() {
        let trace_baseline = BaselineProfile::Trace(vec![5.0; 10]);
        let stats_baseline = BaselineProfile::Stats(SeriesStats::from_series(&[5.0; 10]));

        let cases = [
            (Strategy::ThresholdHysteresis, &trace_baseline),
            (Strategy::CorrelationMatch, &trace_baseline),
            (Strategy::MomentTrendMatch, &stats_baseline),
            (Strategy::FrequencyPeakMatch, &trace_baseline),
        ];

        for (strategy, baseline) in cases {
            let config = config_with(strategy);
            let mut detector = RingDetector::from_config(&config, baseline).unwrap();

            // Nine deafening frames: window not yet full, no decision
            for _ in 0..9 {
                let event = detector.process_frame(&constant_frame(30000.0));
                assert_eq!(event, None, "strategy {:?} scored during cold start", strategy);
                assert_eq!(detector.state(), RingState::Idle);
            }
        }
    }

    #[test]
    fn test_threshold_detector_emits_start_and_stop() {
        let config = config_with(Strategy::ThresholdHysteresis);
        let baseline = BaselineProfile::Trace(vec![5.0; 10]);
        let mut detector = RingDetector::from_config(&config, &baseline).unwrap();

        let mut events = Vec::new();
        // 10 quiet frames fill the window, 5 loud frames ring, quiet again
        for volume in [5.0; 10].iter().chain([100.0; 5].iter()).chain([5.0; 3].iter()) {
            if let Some(event) = detector.process_frame(&constant_frame(*volume)) {
                events.push(event);
            }
        }

        assert_eq!(
            events,
            vec![
                RingEvent::Started {
                    index: 10,
                    score: 100.0
                },
                RingEvent::Stopped { index: 15 },
            ]
        );
        assert_eq!(detector.state(), RingState::Idle);
    }

    #[test]
    fn test_prefill_skips_cold_start() {
        let config = config_with(Strategy::ThresholdHysteresis);
        let baseline = BaselineProfile::Trace(vec![5.0; 10]);
        let mut detector = RingDetector::from_config(&config, &baseline).unwrap();

        detector.prefill(5.0);
        // First live frame is already scored
        let event = detector.process_frame(&constant_frame(100.0));
        assert!(matches!(event, Some(RingEvent::Started { .. })));
    }

    #[test]
    fn test_run_loop_broadcasts_events_and_ends_cleanly() {
        let config = config_with(Strategy::ThresholdHysteresis);
        let baseline = BaselineProfile::Trace(vec![5.0; 10]);
        let mut detector = RingDetector::from_config(&config, &baseline).unwrap();

        let volumes: Vec<f64> = [5.0; 10]
            .iter()
            .chain([100.0; 5].iter())
            .chain([5.0; 3].iter())
            .copied()
            .collect();
        let mut source = ScriptedSource::from_volumes(&volumes, 64);

        let (tx, mut rx) = broadcast::channel(16);
        run_loop(&mut source, &mut detector, &tx, Duration::ZERO).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            RingEvent::Started {
                index: 10,
                score: 100.0
            }
        );
        assert_eq!(rx.try_recv().unwrap(), RingEvent::Stopped { index: 15 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_run_loop_propagates_stream_failure() {
        struct FailingSource;
        impl SampleSource for FailingSource {
            fn read_frame(&mut self) -> Result<Vec<i16>, CaptureError> {
                Err(CaptureError::StreamFailure {
                    reason: "device unplugged".to_string(),
                })
            }
        }

        let config = config_with(Strategy::ThresholdHysteresis);
        let baseline = BaselineProfile::Trace(vec![5.0; 10]);
        let mut detector = RingDetector::from_config(&config, &baseline).unwrap();
        let (tx, _rx) = broadcast::channel(16);

        let result = run_loop(&mut FailingSource, &mut detector, &tx, Duration::ZERO);
        assert!(matches!(
            result,
            Err(CaptureError::StreamFailure { .. })
        ));
    }
}
