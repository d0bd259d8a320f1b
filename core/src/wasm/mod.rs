//! WASM runtime wrapper
//!
//! Provides abstractions over wasmtime for compiling and running logic modules.
//!
//! # Key Types
//!
//! - [`WasmEngine`] - Shared WASM engine (one per process)
//! - [`LogicInstance`] - An instantiated logic module with both entry points resolved
//! - [`HostContext`] - Store data reached by the host imports

mod engine;
mod instance;
mod state;


pub use engine::WasmEngine;
pub use instance::LogicInstance;
pub use state::{HostContext, SoundWindow, guest_range, read_guest_str};
