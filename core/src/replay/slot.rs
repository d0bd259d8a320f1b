//! Replay slots: an arena-sized memory-mapped mirror plus an input log path

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use hotloop_shared::REPLAY_FILE_EXTENSION;
use memmap2::{MmapMut, MmapOptions};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::ReplayError;

/// File name for a slot's `kind` ("input" or "state") file.
pub fn slot_file_name(index: usize, kind: &str) -> String {
    format!("replay_{index}_{kind}.{REPLAY_FILE_EXTENSION}")
}

pub struct ReplaySlot {
    index: usize,
    state_path: PathBuf,
    input_path: PathBuf,
    mirror: Option<MmapMut>,
    /// xxh3 of the arena at the last capture.
    captured: Option<u64>,
}

impl ReplaySlot {
    /// Set up slot `index`, mapping a mirror of `arena_len` bytes.
    ///
    /// Mapping failures are logged; the slot then has no mirror.
    pub fn create(directory: &Path, index: usize, arena_len: usize) -> Self {
        let state_path = directory.join(slot_file_name(index, "state"));
        let input_path = directory.join(slot_file_name(index, "input"));
        let mirror = match map_mirror(&state_path, arena_len) {
            Ok(mirror) => Some(mirror),
            Err(e) => {
                tracing::warn!("Replay slot {} unavailable: {}", index, e);
                None
            }
        };
        Self {
            index,
            state_path,
            input_path,
            mirror,
            captured: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn has_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    pub fn mirror(&self) -> Option<&[u8]> {
        self.mirror.as_deref()
    }

    /// Checksum taken when the snapshot was captured, if it was.
    pub fn snapshot_checksum(&self) -> Option<u64> {
        self.captured
    }

    /// Copy the live arena into the mirror.
    pub fn capture(&mut self, arena: &[u8]) -> Result<u64, ReplayError> {
        let mirror = self
            .mirror
            .as_mut()
            .ok_or(ReplayError::MirrorUnavailable(self.index))?;
        if mirror.len() != arena.len() {
            return Err(ReplayError::SizeMismatch {
                arena: arena.len(),
                mirror: mirror.len(),
            });
        }
        mirror.copy_from_slice(arena);
        let checksum = xxh3_64(arena);
        self.captured = Some(checksum);
        Ok(checksum)
    }

    /// Copy the mirror back over the live arena.
    ///
    /// A mirror whose contents no longer match the capture checksum (the
    /// state file was written by someone else) is refused and the arena is
    /// left alone.
    pub fn restore(&self, arena: &mut [u8]) -> Result<u64, ReplayError> {
        let mirror = self
            .mirror
            .as_ref()
            .ok_or(ReplayError::MirrorUnavailable(self.index))?;
        if mirror.len() != arena.len() {
            return Err(ReplayError::SizeMismatch {
                arena: arena.len(),
                mirror: mirror.len(),
            });
        }
        let found = xxh3_64(mirror);
        if let Some(expected) = self.captured
            && expected != found
        {
            return Err(ReplayError::SnapshotChanged {
                slot: self.index,
                expected,
                found,
            });
        }
        arena.copy_from_slice(mirror);
        Ok(found)
    }
}

fn map_mirror(path: &Path, len: usize) -> Result<MmapMut, ReplayError> {
    let io_error = |source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(io_error)?;
    file.set_len(len as u64).map_err(io_error)?;

    // SAFETY: the mirror file is created and truncated by this process and
    // only ever accessed through this mapping.
    unsafe { MmapOptions::new().len(len).map_mut(&file) }.map_err(io_error)
}
