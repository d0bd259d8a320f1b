//! Store data shared between the host and the running logic module

use std::ops::Range;

use wasmtime::Memory;

use crate::arena::ArenaLayout;
use crate::files::FileServices;
use crate::framebuffer::FrameBuffer;
use crate::input::InputFrame;

/// Interleaved stereo i16 window filled by the audio entry point.
#[derive(Debug, Clone, Default)]
pub struct SoundWindow {
    samples: Vec<i16>,
    sample_count: u32,
    samples_per_second: u32,
    written: u32,
}

impl SoundWindow {
    /// Size the window for `sample_count` stereo pairs and zero it.
    pub fn prepare(&mut self, sample_count: u32, samples_per_second: u32) {
        self.samples.clear();
        self.samples.resize(sample_count as usize * 2, 0);
        self.sample_count = sample_count;
        self.samples_per_second = samples_per_second;
        self.written = 0;
    }

    /// Append one stereo pair. Returns false once the window is full.
    pub fn push(&mut self, left: i16, right: i16) -> bool {
        if self.written >= self.sample_count {
            return false;
        }
        let at = self.written as usize * 2;
        self.samples[at] = left;
        self.samples[at + 1] = right;
        self.written += 1;
        true
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn samples_per_second(&self) -> u32 {
        self.samples_per_second
    }

    /// Pairs written so far this frame.
    pub fn written(&self) -> u32 {
        self.written
    }

    /// The whole window; unwritten pairs are silence.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }
}

/// Host-side state reached by every host import
///
/// Lives in the wasmtime store, so it persists across code reloads exactly
/// like the arena does.
pub struct HostContext {
    /// The arena memory (set once the arena is allocated)
    pub memory: Option<Memory>,
    pub layout: ArenaLayout,
    /// Input for the frame being updated
    pub input: InputFrame,
    pub frame: FrameBuffer,
    pub sound: SoundWindow,
    pub files: FileServices,
    /// Set by the logic module once it has initialized its permanent storage
    pub memory_initialized: bool,
}

impl HostContext {
    pub fn new(layout: ArenaLayout, frame: FrameBuffer, files: FileServices) -> Self {
        Self {
            memory: None,
            layout,
            input: InputFrame::default(),
            frame,
            sound: SoundWindow::default(),
            files,
            memory_initialized: false,
        }
    }
}

/// Bounds-check a guest pointer/length pair against memory of `memory_len` bytes.
pub fn guest_range(ptr: u32, len: u32, memory_len: usize) -> Option<Range<usize>> {
    let start = ptr as usize;
    let end = start.checked_add(len as usize)?;
    (end <= memory_len).then_some(start..end)
}

/// Read a UTF-8 string out of guest memory.
pub fn read_guest_str(data: &[u8], ptr: u32, len: u32) -> Option<&str> {
    let range = guest_range(ptr, len, data.len())?;
    std::str::from_utf8(&data[range]).ok()
}
