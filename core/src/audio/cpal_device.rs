//! Sound device backed by a cpal output stream
//!
//! The ring lives behind a mutex shared with the stream callback. The
//! callback reads stereo pairs at the play cursor and advances it; the write
//! cursor is taken to be one callback's worth of bytes ahead.

use std::sync::{Arc, Mutex, MutexGuard};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error};

use crate::error::AudioError;

use super::device::{SoundDevice, split_regions};
use super::plan::CursorPositions;

struct Ring {
    buffer: Vec<u8>,
    play_cursor: usize,
    last_callback_bytes: usize,
    playing: bool,
}

impl Ring {
    fn next_pair(&mut self) -> (i16, i16) {
        if !self.playing || self.buffer.len() < 4 {
            return (0, 0);
        }
        let at = self.play_cursor;
        let b = &self.buffer[at..at + 4];
        let pair = (
            i16::from_ne_bytes([b[0], b[1]]),
            i16::from_ne_bytes([b[2], b[3]]),
        );
        self.play_cursor = (at + 4) % self.buffer.len();
        pair
    }
}

fn lock(ring: &Mutex<Ring>) -> MutexGuard<'_, Ring> {
    ring.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Render interleaved frames of `channels` from the ring
fn render<T: Copy>(ring: &Mutex<Ring>, data: &mut [T], channels: usize, convert: impl Fn(i16) -> T) {
    let mut ring = lock(ring);
    ring.last_callback_bytes = data.len() / channels.max(1) * 4;
    for frame in data.chunks_mut(channels.max(1)) {
        let (left, right) = ring.next_pair();
        for (channel, sample) in frame.iter_mut().enumerate() {
            *sample = convert(match channel {
                0 => left,
                1 => right,
                _ => 0,
            });
        }
    }
}

/// Audio output using cpal and a cursor-addressed ring
pub struct CpalDevice {
    ring: Arc<Mutex<Ring>>,
    /// The cpal stream (kept alive for the duration)
    stream: cpal::Stream,
}

impl CpalDevice {
    /// Open the default output device at `samples_per_second`, stereo.
    pub fn new(samples_per_second: u32, buffer_size: u32) -> Result<Self, AudioError> {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or_else(|| {
            AudioError::DeviceUnavailable("No audio output device available".to_string())
        })?;

        let default_config = device.default_output_config().map_err(|e| {
            AudioError::DeviceUnavailable(format!("Failed to get default output config: {}", e))
        })?;
        let config = cpal::StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(samples_per_second),
            buffer_size: cpal::BufferSize::Default,
        };
        let channels = config.channels as usize;

        let ring = Arc::new(Mutex::new(Ring {
            buffer: vec![0; buffer_size as usize],
            play_cursor: 0,
            last_callback_bytes: 0,
            playing: false,
        }));

        let shared = Arc::clone(&ring);
        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render(&shared, data, channels, |s| s as f32 / 32768.0);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I16 => device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    render(&shared, data, channels, |s| s);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::U16 => device.build_output_stream(
                &config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    render(&shared, data, channels, |s| (s as i32 + 32768) as u16);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            other => {
                return Err(AudioError::DeviceUnavailable(format!(
                    "Unsupported sample format: {:?}",
                    other
                )));
            }
        }
        .map_err(|e| AudioError::Stream(format!("Failed to build audio stream: {}", e)))?;

        debug!(samples_per_second, buffer_size, "Audio stream built");

        Ok(Self { ring, stream })
    }
}

impl SoundDevice for CpalDevice {
    fn buffer_size(&self) -> u32 {
        lock(&self.ring).buffer.len() as u32
    }

    fn cursors(&mut self) -> Result<CursorPositions, AudioError> {
        let ring = lock(&self.ring);
        if ring.buffer.is_empty() {
            return Err(AudioError::CursorQuery);
        }
        let write = (ring.play_cursor + ring.last_callback_bytes) % ring.buffer.len();
        Ok(CursorPositions {
            play: ring.play_cursor as u32,
            write: write as u32,
        })
    }

    fn write_regions(
        &mut self,
        offset: u32,
        len: u32,
        fill: &mut dyn FnMut(&mut [u8], &mut [u8]),
    ) -> Result<(), AudioError> {
        let mut ring = lock(&self.ring);
        let (first, second) = split_regions(&mut ring.buffer, offset, len)?;
        fill(first, second);
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        lock(&self.ring).playing = true;
        self.stream
            .play()
            .map_err(|e| AudioError::Stream(format!("Failed to play audio stream: {}", e)))?;
        debug!("Audio stream started");
        Ok(())
    }
}
