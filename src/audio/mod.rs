// Audio input layer
//
// Capture runs on the cpal callback thread and hands fixed-size i16
// frames to the detection loop through a lock-free SPSC ring buffer.
// Everything downstream of `SampleSource::read_frame` is agnostic to
// where the frames come from, so tests replay scripted frames through
// the same interface.

pub mod capture;
pub mod volume;

pub use capture::{CaptureStream, SampleSource, ScriptedSource};
pub use volume::extract_volume;
