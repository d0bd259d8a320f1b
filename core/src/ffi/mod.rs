//! Host imports available to the logic module
//!
//! Everything is registered under the `env` module. The arena itself is
//! defined separately by the code host, since it belongs to one store.

mod files;
mod input;
mod media;
mod system;

#[cfg(test)]
mod tests;

use anyhow::Result;
use hotloop_shared::HOST_MODULE;
use wasmtime::Linker;

use crate::wasm::HostContext;

/// Register all host functions with the linker
pub fn register_host_ffi(linker: &mut Linker<HostContext>) -> Result<()> {
    // System / arena functions
    linker.func_wrap(HOST_MODULE, "log", system::log_message)?;
    linker.func_wrap(HOST_MODULE, "permanent_storage", system::permanent_storage)?;
    linker.func_wrap(HOST_MODULE, "permanent_storage_size", system::permanent_storage_size)?;
    linker.func_wrap(HOST_MODULE, "transient_storage", system::transient_storage)?;
    linker.func_wrap(HOST_MODULE, "transient_storage_size", system::transient_storage_size)?;
    linker.func_wrap(HOST_MODULE, "memory_initialized", system::memory_initialized)?;
    linker.func_wrap(HOST_MODULE, "mark_memory_initialized", system::mark_memory_initialized)?;

    // Input functions
    linker.func_wrap(HOST_MODULE, "button_ended_down", input::button_ended_down)?;
    linker.func_wrap(HOST_MODULE, "button_half_transitions", input::button_half_transitions)?;
    linker.func_wrap(HOST_MODULE, "controller_is_analog", input::controller_is_analog)?;
    linker.func_wrap(HOST_MODULE, "stick_x", input::stick_x)?;
    linker.func_wrap(HOST_MODULE, "stick_y", input::stick_y)?;
    linker.func_wrap(HOST_MODULE, "mouse_x", input::mouse_x)?;
    linker.func_wrap(HOST_MODULE, "mouse_y", input::mouse_y)?;
    linker.func_wrap(HOST_MODULE, "mouse_z", input::mouse_z)?;
    linker.func_wrap(HOST_MODULE, "mouse_button_ended_down", input::mouse_button_ended_down)?;

    // Frame buffer functions
    linker.func_wrap(HOST_MODULE, "frame_width", media::frame_width)?;
    linker.func_wrap(HOST_MODULE, "frame_height", media::frame_height)?;
    linker.func_wrap(HOST_MODULE, "frame_pitch", media::frame_pitch)?;
    linker.func_wrap(HOST_MODULE, "frame_put_pixel", media::frame_put_pixel)?;
    linker.func_wrap(HOST_MODULE, "frame_write_row", media::frame_write_row)?;

    // Sound functions
    linker.func_wrap(HOST_MODULE, "sound_sample_count", media::sound_sample_count)?;
    linker.func_wrap(HOST_MODULE, "sound_samples_per_second", media::sound_samples_per_second)?;
    linker.func_wrap(HOST_MODULE, "sound_output_sample", media::sound_output_sample)?;
    linker.func_wrap(HOST_MODULE, "sound_write_samples", media::sound_write_samples)?;

    // File services
    linker.func_wrap(HOST_MODULE, "read_entire_file", files::read_entire_file)?;
    linker.func_wrap(HOST_MODULE, "file_size", files::file_size)?;
    linker.func_wrap(HOST_MODULE, "file_copy", files::file_copy)?;
    linker.func_wrap(HOST_MODULE, "free_file_memory", files::free_file_memory)?;
    linker.func_wrap(HOST_MODULE, "write_entire_file", files::write_entire_file)?;

    Ok(())
}
