// Detection pipeline
//
// RollingWindow buffers the most recent N loudness scalars, a
// SimilarityScorer compares the window against the baseline profile,
// and RingStateMachine turns the per-sample match decisions into
// discrete ring events. The pipeline module wires the pieces to a
// SampleSource and an event channel.

pub mod pipeline;
pub mod scorer;
pub mod smoothing;
pub mod state_machine;
pub mod stats;
pub mod window;

pub use pipeline::{run_loop, RingDetector};
pub use scorer::{
    build_scorer, CorrelationMatch, FrequencyPeakMatch, MomentTrendMatch, SimilarityScore,
    SimilarityScorer, ThresholdHysteresis,
};
pub use state_machine::{Decision, RingEvent, RingState, RingStateMachine};
pub use stats::SeriesStats;
pub use window::{LoudnessSample, RollingWindow};
