// Microphone capture via cpal
//
// The cpal callback de-interleaves the first channel, accumulates
// samples into fixed-size frames and pushes complete frames into an
// rtrb SPSC ring buffer. The detection loop pops frames from the
// consumer side; the callback never blocks and never allocates after
// the staging buffer reaches frame size. When the queue is full the
// newest frame is dropped with a warning - the window only ever wants
// the most recent data, and stalling the audio thread is worse than a
// gap.
//
// The capture device is released by dropping the CaptureStream; there
// is no signal handler and no global device handle.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use std::time::Duration;

use crate::config::AudioConfig;
use crate::error::CaptureError;

/// Interval the consumer waits before re-polling an empty frame queue.
const EMPTY_QUEUE_BACKOFF: Duration = Duration::from_micros(500);

/// A source of fixed-size audio frames.
///
/// `read_frame` blocks until a frame is available or the source fails.
/// Finite sources return `CaptureError::EndOfStream` once exhausted.
pub trait SampleSource {
    fn read_frame(&mut self) -> Result<Vec<i16>, CaptureError>;
}

/// Live microphone capture. Owns the cpal input stream; dropping the
/// value stops the stream and releases the device on every exit path.
pub struct CaptureStream {
    // Held only for its Drop; the callback owns the producer side.
    _stream: cpal::Stream,
    frames: Consumer<Vec<i16>>,
}

impl CaptureStream {
    /// Open the default input device and start capturing.
    pub fn open(config: &AudioConfig) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;

        let device_config =
            device
                .default_input_config()
                .map_err(|e| CaptureError::StreamOpenFailed {
                    reason: format!("failed to get default input config: {:?}", e),
                })?;
        let stream_config: cpal::StreamConfig = device_config.clone().into();
        let channels = stream_config.channels as usize;

        let (producer, consumer) = RingBuffer::new(config.queue_capacity);
        let mut framer = Framer::new(config.frame_size, producer);

        let err_fn = |err| log::error!("[Capture] input stream error: {}", err);

        let stream = match device_config.sample_format() {
            cpal::SampleFormat::I16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        for frame in data.chunks(channels) {
                            framer.push(frame[0]);
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| CaptureError::StreamOpenFailed {
                    reason: format!("{:?}", e),
                })?,
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        for frame in data.chunks(channels) {
                            let scaled = (frame[0].clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                            framer.push(scaled);
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| CaptureError::StreamOpenFailed {
                    reason: format!("{:?}", e),
                })?,
            other => {
                return Err(CaptureError::UnsupportedFormat {
                    format: format!("{:?}", other),
                })
            }
        };

        stream.play().map_err(|e| CaptureError::StreamOpenFailed {
            reason: format!("failed to start input stream: {}", e),
        })?;

        log::info!(
            "[Capture] input stream open: {} Hz, {} channel(s), frame size {}",
            stream_config.sample_rate.0,
            channels,
            config.frame_size
        );

        Ok(Self {
            _stream: stream,
            frames: consumer,
        })
    }
}

impl SampleSource for CaptureStream {
    fn read_frame(&mut self) -> Result<Vec<i16>, CaptureError> {
        loop {
            match self.frames.pop() {
                Ok(frame) => return Ok(frame),
                Err(rtrb::PopError::Empty) => {
                    if self.frames.is_abandoned() {
                        return Err(CaptureError::StreamFailure {
                            reason: "capture callback stopped producing".to_string(),
                        });
                    }
                    std::thread::sleep(EMPTY_QUEUE_BACKOFF);
                }
            }
        }
    }
}

/// Accumulates single samples into fixed-size frames and forwards
/// complete frames to the ring buffer. Lives inside the audio callback.
struct Framer {
    frame_size: usize,
    staging: Vec<i16>,
    producer: Producer<Vec<i16>>,
    dropped: u64,
}

impl Framer {
    fn new(frame_size: usize, producer: Producer<Vec<i16>>) -> Self {
        Self {
            frame_size,
            staging: Vec::with_capacity(frame_size),
            producer,
            dropped: 0,
        }
    }

    #[inline]
    fn push(&mut self, sample: i16) {
        self.staging.push(sample);
        if self.staging.len() == self.frame_size {
            let frame = std::mem::replace(&mut self.staging, Vec::with_capacity(self.frame_size));
            if self.producer.push(frame).is_err() {
                self.dropped += 1;
                // Rate-limit: warn on the first drop and every 100th after
                if self.dropped == 1 || self.dropped % 100 == 0 {
                    log::warn!(
                        "[Capture] frame queue full, dropped {} frame(s)",
                        self.dropped
                    );
                }
            }
        }
    }
}

/// Deterministic in-memory source for tests and fixture replay.
pub struct ScriptedSource {
    frames: std::vec::IntoIter<Vec<i16>>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Vec<i16>>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }

    /// Build frames of constant amplitude so that each frame's mean
    /// absolute volume equals the requested value exactly.
    pub fn from_volumes(volumes: &[f64], frame_size: usize) -> Self {
        let frames = volumes
            .iter()
            .map(|&v| vec![v.round() as i16; frame_size])
            .collect();
        Self::new(frames)
    }
}

impl SampleSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<Vec<i16>, CaptureError> {
        self.frames.next().ok_or(CaptureError::EndOfStream)
    }
}
