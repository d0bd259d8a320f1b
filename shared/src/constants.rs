//! Centralized constants for the hotloop platform layer.
//!
//! Single source of truth for the defaults shared by the core runtime,
//! the launcher and the test fixtures.

/// Size of one WebAssembly linear-memory page.
pub const WASM_PAGE_SIZE: u64 = 64 * 1024;

// === Memory arena ===

/// Offset of the arena inside the logic module's linear memory.
///
/// The first megabyte is left to the logic module for its stack and static data.
pub const DEFAULT_ARENA_BASE: u64 = 1024 * 1024;

/// Default size of the permanent partition (64 MiB).
pub const DEFAULT_PERMANENT_SIZE: u64 = 64 * 1024 * 1024;

/// Default size of the transient partition (256 MiB).
pub const DEFAULT_TRANSIENT_SIZE: u64 = 256 * 1024 * 1024;

/// Largest arena a 32-bit linear memory can address (4 GiB).
pub const MAX_ARENA_BYTES: u64 = 4 * 1024 * 1024 * 1024;

// === Audio ===

/// Default output sample rate.
pub const DEFAULT_SAMPLES_PER_SECOND: u32 = 48_000;

/// Bytes in one interleaved stereo sample pair (2 x i16).
pub const BYTES_PER_SAMPLE: u32 = 4;

/// Default ring buffer length in seconds.
pub const DEFAULT_BUFFER_SECONDS: u32 = 1;

/// Number of recent play cursors kept for diagnostics.
pub const PLAY_CURSOR_HISTORY: usize = 15;

// === Scheduling ===

/// Default update rate when the display refresh rate is unknown (60 Hz / 2).
pub const DEFAULT_UPDATE_HZ: u32 = 30;

// === Video ===

/// Bytes per pixel in the frame buffer (0xXXRRGGBB).
pub const BYTES_PER_PIXEL: u32 = 4;

/// Default frame buffer width.
pub const DEFAULT_FRAME_WIDTH: u32 = 960;

/// Default frame buffer height.
pub const DEFAULT_FRAME_HEIGHT: u32 = 540;

// === Replay ===

/// Number of replay slots (numbered 1..=REPLAY_SLOT_COUNT).
pub const REPLAY_SLOT_COUNT: usize = 4;

/// File extension for replay mirrors and input logs.
pub const REPLAY_FILE_EXTENSION: &str = "hlr";

// === Code host ===

/// Export name of the update/render entry point.
pub const UPDATE_AND_RENDER_EXPORT: &str = "update_and_render";

/// Export name of the audio entry point.
pub const GET_SOUND_SAMPLES_EXPORT: &str = "get_sound_samples";

/// Host import module name.
pub const HOST_MODULE: &str = "env";
