//! Sound device seam and an in-memory implementation

use std::time::Instant;

use crate::error::AudioError;

use super::plan::CursorPositions;

/// A circular hardware buffer the synchronizer writes ahead into.
pub trait SoundDevice {
    /// Ring buffer length in bytes.
    fn buffer_size(&self) -> u32;

    /// Current play and write cursors.
    fn cursors(&mut self) -> Result<CursorPositions, AudioError>;

    /// Lock `len` bytes starting at `offset` and hand them to `fill` as up to
    /// two regions (the second is non-empty only when the range wraps).
    /// The lock is released when `fill` returns.
    fn write_regions(
        &mut self,
        offset: u32,
        len: u32,
        fill: &mut dyn FnMut(&mut [u8], &mut [u8]),
    ) -> Result<(), AudioError>;

    /// Start looping playback.
    fn play(&mut self) -> Result<(), AudioError>;
}

/// Split a wrapped range of `buffer` into its two contiguous regions.
pub(crate) fn split_regions(
    buffer: &mut [u8],
    offset: u32,
    len: u32,
) -> Result<(&mut [u8], &mut [u8]), AudioError> {
    let size = buffer.len();
    let (offset, len) = (offset as usize, len as usize);
    if offset >= size || len > size {
        return Err(AudioError::Lock {
            offset: offset as u32,
            len: len as u32,
        });
    }
    let first_len = len.min(size - offset);
    let second_len = len - first_len;
    let (head, tail) = buffer.split_at_mut(offset);
    Ok((&mut tail[..first_len], &mut head[..second_len]))
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    /// Cursors move only through [`SimulatedDevice::advance`].
    Manual,
    /// Play cursor follows wall time once playing.
    Realtime { started: Option<Instant> },
}

/// In-memory ring buffer with a scriptable play cursor
///
/// The write cursor always sits a fixed number of bytes past the play
/// cursor. Query and lock failures can be injected to exercise the
/// synchronizer's recovery path.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    buffer: Vec<u8>,
    bytes_per_second: u32,
    bytes_per_sample: u32,
    latency_bytes: u32,
    play_cursor: u32,
    clock: Clock,
    playing: bool,
    failing_queries: u32,
    failing_locks: u32,
    lock_count: u64,
}

impl SimulatedDevice {
    /// A device whose cursors only move when told to.
    pub fn manual(buffer_size: u32, bytes_per_sample: u32, latency_bytes: u32) -> Self {
        Self {
            buffer: vec![0xCD; buffer_size as usize],
            bytes_per_second: 0,
            bytes_per_sample,
            latency_bytes,
            play_cursor: 0,
            clock: Clock::Manual,
            playing: false,
            failing_queries: 0,
            failing_locks: 0,
            lock_count: 0,
        }
    }

    /// A device that consumes `bytes_per_second` of wall time once playing.
    pub fn realtime(
        buffer_size: u32,
        bytes_per_second: u32,
        bytes_per_sample: u32,
        latency_bytes: u32,
    ) -> Self {
        Self {
            bytes_per_second,
            clock: Clock::Realtime { started: None },
            ..Self::manual(buffer_size, bytes_per_sample, latency_bytes)
        }
    }

    /// Move the play cursor forward by `bytes`, wrapping.
    pub fn advance(&mut self, bytes: u32) {
        let size = self.buffer.len() as u64;
        self.play_cursor = ((self.play_cursor as u64 + bytes as u64) % size) as u32;
    }

    /// Make the next `count` cursor queries fail.
    pub fn fail_queries(&mut self, count: u32) {
        self.failing_queries = count;
    }

    /// Make the next `count` locks fail.
    pub fn fail_locks(&mut self, count: u32) {
        self.failing_locks = count;
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Successful locks so far.
    pub fn lock_count(&self) -> u64 {
        self.lock_count
    }

    fn sync_clock(&mut self) {
        if let Clock::Realtime {
            started: Some(started),
        } = self.clock
        {
            let consumed = started.elapsed().as_secs_f64() * self.bytes_per_second as f64;
            let consumed = consumed as u64;
            let aligned = consumed - consumed % self.bytes_per_sample.max(1) as u64;
            self.play_cursor = (aligned % self.buffer.len() as u64) as u32;
        }
    }
}

impl SoundDevice for SimulatedDevice {
    fn buffer_size(&self) -> u32 {
        self.buffer.len() as u32
    }

    fn cursors(&mut self) -> Result<CursorPositions, AudioError> {
        if self.failing_queries > 0 {
            self.failing_queries -= 1;
            return Err(AudioError::CursorQuery);
        }
        self.sync_clock();
        let size = self.buffer.len() as u64;
        Ok(CursorPositions {
            play: self.play_cursor,
            write: ((self.play_cursor as u64 + self.latency_bytes as u64) % size) as u32,
        })
    }

    fn write_regions(
        &mut self,
        offset: u32,
        len: u32,
        fill: &mut dyn FnMut(&mut [u8], &mut [u8]),
    ) -> Result<(), AudioError> {
        if self.failing_locks > 0 {
            self.failing_locks -= 1;
            return Err(AudioError::Lock { offset, len });
        }
        let (first, second) = split_regions(&mut self.buffer, offset, len)?;
        fill(first, second);
        self.lock_count += 1;
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        self.playing = true;
        if let Clock::Realtime { started } = &mut self.clock
            && started.is_none()
        {
            *started = Some(Instant::now());
        }
        Ok(())
    }
}
