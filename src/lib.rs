// Ringwatch - doorbell ring detection from microphone loudness
//
// The crate turns a live microphone signal into a stream of discrete
// ring events: capture yields fixed-size i16 frames, each frame is
// reduced to one loudness scalar, the most recent N scalars are kept in
// a rolling window, a similarity scorer compares the window against a
// pre-recorded baseline profile, and a two-state machine with
// hysteresis converts per-sample match decisions into
// RingStarted / RingStopped events.

pub mod audio;
pub mod baseline;
pub mod config;
pub mod detect;
pub mod error;

pub use baseline::BaselineProfile;
pub use config::{AppConfig, Strategy};
pub use detect::{RingDetector, RingEvent, RingState};
pub use error::{BaselineError, CaptureError, ConfigError};
