//! Typed errors raised at the platform's resource boundaries
//!
//! Every variant here is recoverable: the component that receives one logs
//! it and skips the effect for the current frame.

use std::path::PathBuf;

use thiserror::Error;

/// Failure in a platform file service called by the logic module.
#[derive(Debug, Error)]
pub enum FileIoError {
    #[error("invalid file name '{0}': must be relative and stay inside the files root")]
    InvalidPath(String),
    #[error("file '{}' is {len} bytes, exceeding the 4 GiB read limit", path.display())]
    TooLarge { path: PathBuf, len: u64 },
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while opening or using a replay slot.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay slot {0} has no memory mirror")]
    MirrorUnavailable(usize),
    #[error("snapshot size mismatch: arena is {arena} bytes, mirror is {mirror} bytes")]
    SizeMismatch { arena: usize, mirror: usize },
    #[error("replay slot {slot} snapshot changed since capture ({expected:016x} != {found:016x})")]
    SnapshotChanged { slot: usize, expected: u64, found: u64 },
    #[error("replay I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by a sound device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("failed to query ring buffer cursors")]
    CursorQuery,
    #[error("failed to lock {len} bytes at offset {offset} of the ring buffer")]
    Lock { offset: u32, len: u32 },
    #[error("audio stream error: {0}")]
    Stream(String),
}
