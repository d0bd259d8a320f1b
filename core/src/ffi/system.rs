//! Logging and arena layout FFI functions

use wasmtime::Caller;

use crate::wasm::{HostContext, read_guest_str};

/// Log a message from WASM
pub(super) fn log_message(caller: Caller<'_, HostContext>, ptr: u32, len: u32) {
    if let Some(memory) = caller.data().memory
        && let Some(msg) = read_guest_str(memory.data(&caller), ptr, len)
    {
        tracing::info!("[LOGIC] {}", msg);
    }
}

/// Offset of the permanent partition
pub(super) fn permanent_storage(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().layout.permanent().start as u32
}

pub(super) fn permanent_storage_size(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().layout.permanent().len as u32
}

/// Offset of the transient partition
pub(super) fn transient_storage(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().layout.transient().start as u32
}

pub(super) fn transient_storage_size(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().layout.transient().len as u32
}

pub(super) fn memory_initialized(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().memory_initialized as u32
}

pub(super) fn mark_memory_initialized(mut caller: Caller<'_, HostContext>) {
    caller.data_mut().memory_initialized = true;
}
