//! Audio synchronizer
//!
//! Each frame the synchronizer reads the device cursors, decides how many
//! bytes to generate and where in the ring they go, and copies the logic
//! module's samples there. The target is recomputed from fresh cursor
//! readings every frame rather than from a fixed latency assumption.

mod device;
mod plan;

#[cfg(feature = "cpal")]
mod cpal_device;


use hotloop_shared::PLAY_CURSOR_HISTORY;

use crate::error::AudioError;

#[cfg(feature = "cpal")]
pub use cpal_device::CpalDevice;
pub use device::{SimulatedDevice, SoundDevice};
pub use plan::{CursorPositions, SoundOutput, WritePlan, plan_write};

/// Measured distance between the play and write cursors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioLatency {
    pub bytes: u32,
    pub seconds: f32,
}

pub struct AudioSync {
    output: SoundOutput,
    running_sample_index: u64,
    sound_is_valid: bool,
    latency: AudioLatency,
    last_cursors: Option<CursorPositions>,
    play_cursor_history: [u32; PLAY_CURSOR_HISTORY],
    history_index: usize,
}

impl AudioSync {
    pub fn new(output: SoundOutput) -> Self {
        Self {
            output,
            running_sample_index: 0,
            sound_is_valid: false,
            latency: AudioLatency::default(),
            last_cursors: None,
            play_cursor_history: [0; PLAY_CURSOR_HISTORY],
            history_index: 0,
        }
    }

    pub fn output(&self) -> &SoundOutput {
        &self.output
    }

    /// Clear the whole ring to silence and start looping playback.
    pub fn start<D: SoundDevice + ?Sized>(&mut self, device: &mut D) -> Result<(), AudioError> {
        let size = device.buffer_size();
        if size != self.output.buffer_size {
            tracing::warn!(
                device = size,
                expected = self.output.buffer_size,
                "Sound device ring size differs from configuration"
            );
            self.output.buffer_size = size;
        }
        let mut silence = |first: &mut [u8], second: &mut [u8]| {
            first.fill(0);
            second.fill(0);
        };
        device.write_regions(0, size, &mut silence)?;
        device.play()?;
        tracing::debug!(
            bytes = size,
            samples_per_second = self.output.samples_per_second,
            "Sound output started"
        );
        Ok(())
    }

    /// Plan this frame's write from the device cursors.
    ///
    /// `elapsed_seconds` is the wall time spent in the frame so far. Returns
    /// `None`, and marks sound invalid, when the cursors cannot be read.
    pub fn plan<D: SoundDevice + ?Sized>(
        &mut self,
        device: &mut D,
        target_seconds_per_frame: f32,
        elapsed_seconds: f32,
    ) -> Option<WritePlan> {
        let cursors = match device.cursors() {
            Ok(cursors) => cursors,
            Err(e) => {
                if self.sound_is_valid {
                    tracing::debug!("{}", e);
                }
                self.sound_is_valid = false;
                return None;
            }
        };

        if !self.sound_is_valid {
            self.running_sample_index = (cursors.write / self.output.bytes_per_sample) as u64;
            self.sound_is_valid = true;
        }
        self.observe(cursors);

        let actual = self
            .output
            .remaining_frame_bytes(target_seconds_per_frame, elapsed_seconds);
        Some(plan_write(
            &self.output,
            self.running_sample_index,
            cursors,
            actual,
        ))
    }

    fn observe(&mut self, cursors: CursorPositions) {
        self.last_cursors = Some(cursors);
        self.play_cursor_history[self.history_index] = cursors.play;
        self.history_index = (self.history_index + 1) % PLAY_CURSOR_HISTORY;

        let mut unwrapped_write = cursors.write;
        if unwrapped_write < cursors.play {
            unwrapped_write += self.output.buffer_size;
        }
        let bytes = unwrapped_write - cursors.play;
        self.latency = AudioLatency {
            bytes,
            seconds: bytes as f32 / self.output.bytes_per_second() as f32,
        };
    }

    /// Copy `samples` into the planned region and advance the running index.
    ///
    /// Returns the number of stereo pairs written (0 if the lock failed).
    pub fn commit<D: SoundDevice + ?Sized>(
        &mut self,
        device: &mut D,
        plan: &WritePlan,
        samples: &[i16],
    ) -> u32 {
        let bytes: &[u8] = bytemuck::cast_slice(samples);
        let len = self
            .output
            .align(plan.bytes_to_write.min(bytes.len() as u32));
        if len == 0 {
            return 0;
        }
        let source = &bytes[..len as usize];
        let mut copy = |first: &mut [u8], second: &mut [u8]| {
            let (head, tail) = source.split_at(first.len());
            first.copy_from_slice(head);
            second.copy_from_slice(tail);
        };
        let result = device.write_regions(plan.byte_to_lock, len, &mut copy);
        match result {
            Ok(()) => {
                let pairs = len / self.output.bytes_per_sample;
                self.running_sample_index += pairs as u64;
                pairs
            }
            Err(e) => {
                tracing::debug!("{}", e);
                0
            }
        }
    }

    pub fn sound_is_valid(&self) -> bool {
        self.sound_is_valid
    }

    /// Stereo pairs written since the index was last seeded.
    pub fn running_sample_index(&self) -> u64 {
        self.running_sample_index
    }

    pub fn latency(&self) -> AudioLatency {
        self.latency
    }

    pub fn last_cursors(&self) -> Option<CursorPositions> {
        self.last_cursors
    }

    /// Recent play cursors, oldest first.
    pub fn play_cursor_history(&self) -> impl Iterator<Item = u32> + '_ {
        let (newer, older) = self.play_cursor_history.split_at(self.history_index);
        older.iter().chain(newer).copied()
    }
}
