//! Frame buffer and sound window FFI functions

use wasmtime::Caller;

use crate::wasm::{HostContext, guest_range};

pub(super) fn frame_width(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().frame.width()
}

pub(super) fn frame_height(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().frame.height()
}

pub(super) fn frame_pitch(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().frame.pitch()
}

/// Write one 0xXXRRGGBB pixel; out-of-bounds writes are ignored
pub(super) fn frame_put_pixel(mut caller: Caller<'_, HostContext>, x: u32, y: u32, color: u32) {
    caller.data_mut().frame.put_pixel(x, y, color);
}

/// Copy one pitch-sized row from guest memory into row `y`
///
/// Returns 1 on success, 0 if the row or the source range is out of bounds.
pub(super) fn frame_write_row(mut caller: Caller<'_, HostContext>, y: u32, src_ptr: u32) -> u32 {
    let Some(memory) = caller.data().memory else {
        return 0;
    };
    let (data, ctx) = memory.data_and_store_mut(&mut caller);
    let pitch = ctx.frame.pitch();
    match guest_range(src_ptr, pitch, data.len()) {
        Some(range) => ctx.frame.write_row(y, &data[range]) as u32,
        None => 0,
    }
}

/// Stereo pairs requested for this call
pub(super) fn sound_sample_count(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().sound.sample_count()
}

pub(super) fn sound_samples_per_second(caller: Caller<'_, HostContext>) -> u32 {
    caller.data().sound.samples_per_second()
}

/// Append one stereo pair; extra pairs beyond the request are dropped
pub(super) fn sound_output_sample(mut caller: Caller<'_, HostContext>, left: i32, right: i32) {
    caller.data_mut().sound.push(left as i16, right as i16);
}

/// Append `pair_count` interleaved little-endian i16 pairs from guest memory
///
/// Returns the number of pairs accepted.
pub(super) fn sound_write_samples(
    mut caller: Caller<'_, HostContext>,
    src_ptr: u32,
    pair_count: u32,
) -> u32 {
    let Some(memory) = caller.data().memory else {
        return 0;
    };
    let (data, ctx) = memory.data_and_store_mut(&mut caller);
    let Some(len) = pair_count.checked_mul(4) else {
        return 0;
    };
    let Some(range) = guest_range(src_ptr, len, data.len()) else {
        return 0;
    };
    let mut accepted = 0;
    for pair in data[range].chunks_exact(4) {
        let left = i16::from_le_bytes([pair[0], pair[1]]);
        let right = i16::from_le_bytes([pair[2], pair[3]]);
        if !ctx.sound.push(left, right) {
            break;
        }
        accepted += 1;
    }
    accepted
}
