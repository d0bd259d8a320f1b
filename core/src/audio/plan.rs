//! Per-frame write planning
//!
//! Pure arithmetic over ring-buffer byte offsets, so every step of the
//! computation can be checked against hand-worked numbers.

use hotloop_shared::BYTES_PER_SAMPLE;

/// Format and sizing of the hardware ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundOutput {
    pub samples_per_second: u32,
    /// Bytes per interleaved stereo pair.
    pub bytes_per_sample: u32,
    /// Ring buffer length in bytes.
    pub buffer_size: u32,
    /// Guard margin added past the write cursor.
    pub safety_bytes: u32,
    /// Frames per second the synchronizer is fed at.
    pub update_hz: u32,
}

impl SoundOutput {
    /// Ring of `buffer_seconds` with a safety margin of half a frame.
    ///
    /// Sizes past the 32-bit cursor range saturate; [`SoundOutput::ring_size`]
    /// reports them up front.
    pub fn new(samples_per_second: u32, buffer_seconds: u32, update_hz: u32) -> Self {
        let bytes_per_second = samples_per_second.saturating_mul(BYTES_PER_SAMPLE);
        let max_ring = u32::MAX - u32::MAX % BYTES_PER_SAMPLE;
        Self {
            samples_per_second,
            bytes_per_sample: BYTES_PER_SAMPLE,
            buffer_size: Self::ring_size(samples_per_second, buffer_seconds).unwrap_or(max_ring),
            safety_bytes: bytes_per_second / update_hz.max(1) / 2,
            update_hz: update_hz.max(1),
        }
    }

    /// Ring length in bytes, or `None` when it does not fit a 32-bit cursor.
    pub fn ring_size(samples_per_second: u32, buffer_seconds: u32) -> Option<u32> {
        samples_per_second
            .checked_mul(BYTES_PER_SAMPLE)?
            .checked_mul(buffer_seconds.max(1))
    }

    pub fn bytes_per_second(&self) -> u32 {
        self.samples_per_second * self.bytes_per_sample
    }

    /// Bytes of audio consumed during one frame at the update rate.
    pub fn expected_bytes_per_frame(&self) -> u32 {
        self.bytes_per_second() / self.update_hz
    }

    /// Round down to a whole stereo pair.
    pub fn align(&self, bytes: u32) -> u32 {
        bytes - bytes % self.bytes_per_sample
    }

    /// Audio bytes left in this frame given the wall time already spent.
    ///
    /// Clamped at zero when the frame is already over budget.
    pub fn remaining_frame_bytes(&self, target_seconds_per_frame: f32, elapsed_seconds: f32) -> u32 {
        let remaining = (target_seconds_per_frame - elapsed_seconds).max(0.0);
        self.align((remaining * self.bytes_per_second() as f32) as u32)
    }
}

/// Hardware cursor pair, byte offsets into the ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPositions {
    pub play: u32,
    pub write: u32,
}

/// Where and how much to write this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePlan {
    pub byte_to_lock: u32,
    pub bytes_to_write: u32,
    pub target_cursor: u32,
    /// Predicted play position at the next frame flip (unwrapped).
    pub frame_boundary_byte: u32,
    /// Write cursor unwrapped past the play cursor, plus safety bytes.
    pub safe_write_cursor: u32,
    pub audio_card_is_latent: bool,
}

impl WritePlan {
    /// Stereo pairs to request from the audio entry point.
    pub fn sample_count(&self, output: &SoundOutput) -> u32 {
        self.bytes_to_write / output.bytes_per_sample
    }
}

/// Compute this frame's write.
///
/// When the card's own latency already reaches past the coming frame flip,
/// write one frame ahead of the write cursor (plus safety). Otherwise write
/// up to one full frame past the predicted flip.
pub fn plan_write(
    output: &SoundOutput,
    running_sample_index: u64,
    cursors: CursorPositions,
    actual_bytes_this_frame: u32,
) -> WritePlan {
    let size = output.buffer_size as u64;
    let play = cursors.play as u64;
    let write = cursors.write as u64;

    let byte_to_lock = (running_sample_index * output.bytes_per_sample as u64) % size;
    let expected = output.expected_bytes_per_frame() as u64;
    let safety = output.safety_bytes as u64;

    let frame_boundary_byte = play + actual_bytes_this_frame as u64;

    let mut safe_write_cursor = write;
    if safe_write_cursor < play {
        safe_write_cursor += size;
    }
    debug_assert!(safe_write_cursor >= play);
    safe_write_cursor += safety;

    let audio_card_is_latent = safe_write_cursor >= frame_boundary_byte;
    let target_cursor = if audio_card_is_latent {
        write + expected + safety
    } else {
        frame_boundary_byte + expected
    } % size;

    let bytes_to_write = if byte_to_lock > target_cursor {
        size - byte_to_lock + target_cursor
    } else {
        target_cursor - byte_to_lock
    };

    WritePlan {
        byte_to_lock: byte_to_lock as u32,
        bytes_to_write: bytes_to_write as u32,
        target_cursor: target_cursor as u32,
        frame_boundary_byte: frame_boundary_byte as u32,
        safe_write_cursor: safe_write_cursor as u32,
        audio_card_is_latent,
    }
}
