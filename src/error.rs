// Error types for the ring detection pipeline
//
// Three failure domains, mirroring the lifecycle of the process:
// configuration errors and baseline errors are fatal at startup,
// capture errors are fatal to the running poll loop and are propagated
// to the caller for the shutdown/restart decision. Nothing is retried
// internally.

use std::fmt;

/// Errors raised by the audio capture layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// No input device is available on the default host
    NoInputDevice,

    /// Failed to open or start the input stream
    StreamOpenFailed { reason: String },

    /// The device produces a sample format the pipeline cannot consume
    UnsupportedFormat { format: String },

    /// The capture side died while the detection loop was still reading
    StreamFailure { reason: String },

    /// A finite source has no more frames to yield. Live capture never
    /// returns this; scripted sources use it to signal clean shutdown.
    EndOfStream,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoInputDevice => {
                write!(f, "no default input device found")
            }
            CaptureError::StreamOpenFailed { reason } => {
                write!(f, "failed to open audio stream: {}", reason)
            }
            CaptureError::UnsupportedFormat { format } => {
                write!(f, "unsupported sample format: {}", format)
            }
            CaptureError::StreamFailure { reason } => {
                write!(f, "audio stream failed: {}", reason)
            }
            CaptureError::EndOfStream => write!(f, "sample source exhausted"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::StreamFailure {
            reason: err.to_string(),
        }
    }
}

/// Errors raised while building or loading a baseline profile.
#[derive(Debug, Clone, PartialEq)]
pub enum BaselineError {
    /// The recorded sequence is shorter than the configured minimum
    /// window length
    InsufficientData { required: usize, collected: usize },

    /// Filesystem failure while reading or writing a profile artifact
    Io { path: String, reason: String },

    /// A profile artifact exists but does not parse
    Malformed { path: String, reason: String },
}

impl fmt::Display for BaselineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineError::InsufficientData {
                required,
                collected,
            } => write!(
                f,
                "baseline too short: {} samples recorded, {} required",
                collected, required
            ),
            BaselineError::Io { path, reason } => {
                write!(f, "baseline I/O error on {}: {}", path, reason)
            }
            BaselineError::Malformed { path, reason } => {
                write!(f, "malformed baseline file {}: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for BaselineError {}

/// Errors raised by configuration loading and validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Config file could not be read
    Io { path: String, reason: String },

    /// Config file could not be parsed as JSON
    Parse { path: String, reason: String },

    /// A field holds a value the pipeline cannot run with
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, reason } => {
                write!(f, "failed to read config {}: {}", path, reason)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "failed to parse config {}: {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid config value for {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
