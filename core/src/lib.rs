//! hotloop core - platform layer for a hot-reloading frame loop
//!
//! This crate hosts swappable application logic, records and replays its
//! execution bit for bit, and keeps a circular audio buffer fed ahead of
//! the hardware play position.
//!
//! # Architecture
//!
//! - [`Arena`] - Fixed-size memory owned by the host; survives every reload
//! - [`CodeHost`] - Loads the logic module and swaps it when the source changes
//! - [`ReplayEngine`] - Arena snapshots plus per-frame input logs
//! - [`AudioSync`] - Per-frame ring-buffer write planning
//! - [`Runtime`] - Fixed-rate frame scheduler composing the above

pub mod arena;
pub mod audio;
pub mod code_host;
pub mod config;
pub mod error;
pub mod ffi;
pub mod files;
pub mod framebuffer;
pub mod input;
#[cfg(test)]
mod integration;
pub mod replay;
pub mod runtime;
#[cfg(test)]
pub mod test_utils;
pub mod wasm;

pub use arena::{Arena, ArenaLayout, Partition};
#[cfg(feature = "cpal")]
pub use audio::CpalDevice;
pub use audio::{AudioSync, SimulatedDevice, SoundDevice, SoundOutput, WritePlan, plan_write};
pub use code_host::{CodeHost, CodePaths, CodeUnit};
pub use config::HostConfig;
pub use error::{AudioError, FileIoError, ReplayError};
pub use files::FileServices;
pub use framebuffer::FrameBuffer;
pub use input::{Button, ButtonState, ControllerInput, InputBuffers, InputFrame};
pub use replay::{ReplayEngine, ReplayState};
pub use runtime::{HostCommand, PlatformHooks, Runtime, RuntimeConfig};
pub use wasm::{HostContext, WasmEngine};
