// Audio output - cpal stream fed from a shared sample ring
//
// The emulation thread pushes each frame's samples into the ring; the
// audio callback drains it, substituting silence on underrun.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Cap on buffered samples (~250ms at 44.1kHz); beyond this the emulation
/// is outrunning the device and old samples are dropped
const MAX_BUFFERED_SAMPLES: usize = 11_025;

/// Errors from audio device setup
#[derive(Debug)]
pub enum AudioError {
    NoOutputDevice,
    BuildStream(cpal::BuildStreamError),
    PlayStream(cpal::PlayStreamError),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NoOutputDevice => write!(f, "no audio output device available"),
            AudioError::BuildStream(e) => write!(f, "failed to build audio stream: {}", e),
            AudioError::PlayStream(e) => write!(f, "failed to start audio stream: {}", e),
        }
    }
}

impl std::error::Error for AudioError {}

/// Running audio output stream
pub struct AudioOutput {
    buffer: Arc<Mutex<VecDeque<f32>>>,
    // Held for its lifetime; dropping it stops playback
    _stream: Stream,
}

impl AudioOutput {
    /// Open the default output device as a mono stream at `sample_rate`
    pub fn new(sample_rate: u32, volume: f32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        let buffer = Arc::new(Mutex::new(VecDeque::new()));
        let callback_buffer = Arc::clone(&buffer);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    let mut ring = callback_buffer.lock().unwrap();
                    for sample in data.iter_mut() {
                        *sample = ring.pop_front().unwrap_or(0.0) * volume;
                    }
                },
                |err| log::warn!("audio stream error: {}", err),
                None,
            )
            .map_err(AudioError::BuildStream)?;

        stream.play().map_err(AudioError::PlayStream)?;

        Ok(AudioOutput {
            buffer,
            _stream: stream,
        })
    }

    /// Queue a batch of samples for playback
    pub fn push_samples(&self, samples: &[f32]) {
        let mut ring = self.buffer.lock().unwrap();
        ring.extend(samples.iter().copied());

        let excess = ring.len().saturating_sub(MAX_BUFFERED_SAMPLES);
        if excess > 0 {
            ring.drain(..excess);
        }
    }

    /// Samples currently waiting in the ring
    pub fn queued(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }
}
