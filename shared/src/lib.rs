//! Shared constants and helpers for the hotloop platform layer.
//!
//! Kept dependency-light so the launcher and any tooling can agree on
//! defaults without pulling in the wasm runtime.

pub mod constants;
pub mod fs;

pub use constants::*;
