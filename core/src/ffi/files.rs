//! Platform file service FFI functions
//!
//! Handles are non-zero; 0 always means failure. Failures are logged and
//! never trap the logic module.

use wasmtime::Caller;

use crate::files::safe_truncate_u64;
use crate::wasm::{HostContext, guest_range, read_guest_str};

/// Read a whole file, returning a handle to its contents (0 on failure)
pub(super) fn read_entire_file(mut caller: Caller<'_, HostContext>, ptr: u32, len: u32) -> u32 {
    let Some(memory) = caller.data().memory else {
        return 0;
    };
    let (data, ctx) = memory.data_and_store_mut(&mut caller);
    let Some(name) = read_guest_str(data, ptr, len) else {
        tracing::warn!("read_entire_file: invalid name pointer");
        return 0;
    };
    match ctx.files.open(name) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!("read_entire_file: {}", e);
            0
        }
    }
}

/// Size in bytes of an open file's contents (0 for unknown handles)
pub(super) fn file_size(caller: Caller<'_, HostContext>, handle: u32) -> u32 {
    caller
        .data()
        .files
        .contents(handle)
        .and_then(|c| safe_truncate_u64(c.len() as u64))
        .unwrap_or(0)
}

/// Copy an open file's contents to `dest_ptr`, returning bytes copied
pub(super) fn file_copy(mut caller: Caller<'_, HostContext>, handle: u32, dest_ptr: u32) -> u32 {
    let Some(memory) = caller.data().memory else {
        return 0;
    };
    let (data, ctx) = memory.data_and_store_mut(&mut caller);
    let Some(contents) = ctx.files.contents(handle) else {
        return 0;
    };
    let Some(len) = safe_truncate_u64(contents.len() as u64) else {
        return 0;
    };
    match guest_range(dest_ptr, len, data.len()) {
        Some(range) => {
            data[range].copy_from_slice(contents);
            len
        }
        None => 0,
    }
}

pub(super) fn free_file_memory(mut caller: Caller<'_, HostContext>, handle: u32) {
    caller.data_mut().files.free_file_memory(handle);
}

/// Write `len` bytes at `src_ptr` to a file. Returns 1 if every byte was written.
pub(super) fn write_entire_file(
    mut caller: Caller<'_, HostContext>,
    name_ptr: u32,
    name_len: u32,
    src_ptr: u32,
    len: u32,
) -> u32 {
    let Some(memory) = caller.data().memory else {
        return 0;
    };
    let (data, ctx) = memory.data_and_store_mut(&mut caller);
    let data = &*data;
    let (Some(name), Some(range)) = (
        read_guest_str(data, name_ptr, name_len),
        guest_range(src_ptr, len, data.len()),
    ) else {
        tracing::warn!("write_entire_file: invalid pointer");
        return 0;
    };
    match ctx.files.write_entire_file(name, &data[range]) {
        Ok(()) => 1,
        Err(e) => {
            tracing::warn!("write_entire_file: {}", e);
            0
        }
    }
}
