//! Input record/replay engine
//!
//! Recording captures the whole arena into a slot's mirror and then logs
//! every frame's input. Playback restores the mirror over the live arena and
//! feeds the logged input back, looping forever: when the log runs out the
//! arena is restored again and reading restarts from the first record.
//!
//! ```text
//!        toggle               toggle                 toggle
//! Idle ─────────▶ Recording ─────────▶ Playing ─────────▶ Idle
//!      capture mirror        restore mirror         close log
//!      truncate log          open log
//! ```
//!
//! Given deterministic logic, a replay from the same mirror and log
//! reproduces the arena bit for bit.

mod log;
mod slot;


use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::input::InputFrame;

pub use log::{InputLogReader, InputLogWriter};
pub use slot::{ReplaySlot, slot_file_name};

/// Which slot, if any, is being recorded or played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplayState {
    #[default]
    Idle,
    Recording {
        slot: usize,
    },
    Playing {
        slot: usize,
    },
}

pub struct ReplayEngine {
    directory: PathBuf,
    slots: Vec<ReplaySlot>,
    state: ReplayState,
    recorder: Option<InputLogWriter>,
    player: Option<InputLogReader>,
    frames_recorded: u64,
    playback_position: u64,
    loops_completed: u64,
}

impl ReplayEngine {
    /// Create `slot_count` slots (numbered from 1) under `directory`.
    ///
    /// A slot whose mirror cannot be mapped is kept but unusable.
    pub fn new(directory: impl Into<PathBuf>, slot_count: usize, arena_len: usize) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).with_context(|| {
            format!("Failed to create replay directory: {}", directory.display())
        })?;
        let slots = (1..=slot_count)
            .map(|index| ReplaySlot::create(&directory, index, arena_len))
            .collect();
        Ok(Self {
            directory,
            slots,
            state: ReplayState::Idle,
            recorder: None,
            player: None,
            frames_recorded: 0,
            playback_position: 0,
            loops_completed: 0,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, ReplayState::Recording { .. })
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, ReplayState::Playing { .. })
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot by its 1-based number.
    pub fn slot(&self, slot: usize) -> Option<&ReplaySlot> {
        slot.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    /// Frames appended since recording began.
    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    /// Records consumed since the arena was last restored.
    pub fn playback_position(&self) -> u64 {
        self.playback_position
    }

    /// Times playback ran off the end of its log and restarted.
    pub fn loops_completed(&self) -> u64 {
        self.loops_completed
    }

    /// Begin* may only be called while idle, with a slot in 1..=slot_count.
    fn check_begin(&self, operation: &str, slot: usize) -> bool {
        let idle = self.state == ReplayState::Idle;
        let in_range = (1..=self.slots.len()).contains(&slot);
        debug_assert!(idle, "{operation} called while {:?}", self.state);
        debug_assert!(
            in_range,
            "{operation}: replay slot {slot} out of range 1..={}",
            self.slots.len()
        );
        if !idle || !in_range {
            tracing::error!(
                state = ?self.state,
                slot,
                "Ignoring {} outside its contract",
                operation
            );
            return false;
        }
        true
    }

    /// Snapshot `arena` into the slot's mirror and start a fresh log.
    pub fn begin_recording(&mut self, slot: usize, arena: &[u8]) -> bool {
        if !self.check_begin("begin_recording", slot) {
            return false;
        }
        let entry = &mut self.slots[slot - 1];
        let checksum = match entry.capture(arena) {
            Ok(checksum) => checksum,
            Err(e) => {
                tracing::warn!("Cannot record into slot {}: {}", slot, e);
                return false;
            }
        };
        match InputLogWriter::create(entry.input_path()) {
            Ok(writer) => self.recorder = Some(writer),
            Err(e) => {
                tracing::warn!("Cannot record into slot {}: {}", slot, e);
                return false;
            }
        }
        self.state = ReplayState::Recording { slot };
        self.frames_recorded = 0;
        tracing::info!("Recording into slot {}", slot);
        tracing::debug!(checksum = format_args!("{checksum:016x}"), "Captured arena");
        true
    }

    /// Append this frame's input to the open log.
    pub fn record_frame(&mut self, input: &InputFrame) {
        let Some(recorder) = &mut self.recorder else {
            return;
        };
        match recorder.append(input) {
            Ok(()) => self.frames_recorded += 1,
            Err(e) => tracing::warn!("Dropped recorded frame: {}", e),
        }
    }

    pub fn end_recording(&mut self) {
        if let Some(recorder) = self.recorder.take()
            && let Err(e) = recorder.finish()
        {
            tracing::warn!("Failed to finish input log: {}", e);
        }
        if let ReplayState::Recording { slot } = self.state {
            tracing::info!(frames = self.frames_recorded, "Stopped recording slot {}", slot);
            self.state = ReplayState::Idle;
        }
    }

    /// Restore the slot's mirror over `arena` and start reading its log.
    ///
    /// The log is opened first, so a missing log leaves the arena untouched.
    pub fn begin_playback(&mut self, slot: usize, arena: &mut [u8]) -> bool {
        if !self.check_begin("begin_playback", slot) {
            return false;
        }
        let entry = &self.slots[slot - 1];
        let reader = match InputLogReader::open(entry.input_path()) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!("Cannot play slot {}: {}", slot, e);
                return false;
            }
        };
        let checksum = match entry.restore(arena) {
            Ok(checksum) => checksum,
            Err(e) => {
                tracing::warn!("Cannot play slot {}: {}", slot, e);
                return false;
            }
        };
        self.player = Some(reader);
        self.state = ReplayState::Playing { slot };
        self.playback_position = 0;
        tracing::debug!(checksum = format_args!("{checksum:016x}"), "Restored arena");
        true
    }

    /// Overwrite `input` with the next logged frame, looping at end of log.
    ///
    /// If the log is empty even after restarting, `input` is left untouched.
    pub fn play_frame(&mut self, input: &mut InputFrame, arena: &mut [u8]) {
        let ReplayState::Playing { slot } = self.state else {
            return;
        };
        if let Some(frame) = self.read_next() {
            *input = frame;
            return;
        }

        self.end_playback();
        if !self.begin_playback(slot, arena) {
            return;
        }
        self.loops_completed += 1;
        if let Some(frame) = self.read_next() {
            *input = frame;
        }
    }

    fn read_next(&mut self) -> Option<InputFrame> {
        let player = self.player.as_mut()?;
        match player.next_frame() {
            Ok(Some(frame)) => {
                self.playback_position += 1;
                Some(frame)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Input log read failed: {}", e);
                None
            }
        }
    }

    pub fn end_playback(&mut self) {
        self.player = None;
        if self.is_playing() {
            self.state = ReplayState::Idle;
        }
    }

    /// The user-facing replay toggle.
    ///
    /// Idle starts recording `slot`; recording stops and immediately plays
    /// back the same slot; playing stops.
    pub fn toggle(&mut self, slot: usize, arena: &mut [u8]) {
        match self.state {
            ReplayState::Idle => {
                self.begin_recording(slot, arena);
            }
            ReplayState::Recording { slot: recorded } => {
                self.end_recording();
                self.begin_playback(recorded, arena);
            }
            ReplayState::Playing { slot } => {
                self.end_playback();
                tracing::info!("Stopped playing slot {}", slot);
            }
        }
    }
}
