//! Tests for host FFI functions

use wasmtime::{Engine, Linker};

use super::*;
use crate::input::Button;
use crate::test_utils::test_host;
use crate::wasm::HostContext;

// ============================================================================
// FFI Registration Tests
// ============================================================================

#[test]
fn test_register_host_ffi() {
    let engine = Engine::default();
    let mut linker: Linker<HostContext> = Linker::new(&engine);
    assert!(register_host_ffi(&mut linker).is_ok());
}

// ============================================================================
// Arena layout
// ============================================================================

#[test]
fn test_storage_offsets_match_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = test_host(dir.path());
    let instance = host.instantiate(
        r#"
        (module
            (import "env" "memory" (memory 1))
            (import "env" "permanent_storage" (func $p (result i32)))
            (import "env" "permanent_storage_size" (func $ps (result i32)))
            (import "env" "transient_storage" (func $t (result i32)))
            (import "env" "transient_storage_size" (func $ts (result i32)))
            (func (export "p") (result i32) call $p)
            (func (export "ps") (result i32) call $ps)
            (func (export "t") (result i32) call $t)
            (func (export "ts") (result i32) call $ts))
        "#,
    );

    let mut call = |name: &str| {
        instance
            .get_typed_func::<(), u32>(&mut host.store, name)
            .unwrap()
            .call(&mut host.store, ())
            .unwrap()
    };
    assert_eq!(call("p"), 1024);
    assert_eq!(call("ps"), 32 * 1024);
    assert_eq!(call("t"), 1024 + 32 * 1024);
    assert_eq!(call("ts"), 32 * 1024);
}

#[test]
fn test_memory_initialized_flag() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = test_host(dir.path());
    let instance = host.instantiate(
        r#"
        (module
            (import "env" "memory" (memory 1))
            (import "env" "memory_initialized" (func $get (result i32)))
            (import "env" "mark_memory_initialized" (func $mark))
            (func (export "init") (result i32)
                (if (i32.eqz (call $get)) (then (call $mark)))
                (call $get)))
        "#,
    );

    assert!(!host.store.data().memory_initialized);
    let init = instance
        .get_typed_func::<(), u32>(&mut host.store, "init")
        .unwrap();
    assert_eq!(init.call(&mut host.store, ()).unwrap(), 1);
    assert!(host.store.data().memory_initialized);
}

// ============================================================================
// Input
// ============================================================================

#[test]
fn test_input_queries() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = test_host(dir.path());
    let instance = host.instantiate(
        r#"
        (module
            (import "env" "memory" (memory 1))
            (import "env" "button_ended_down" (func $down (param i32 i32) (result i32)))
            (import "env" "button_half_transitions" (func $htc (param i32 i32) (result i32)))
            (import "env" "stick_x" (func $sx (param i32) (result f32)))
            (import "env" "mouse_button_ended_down" (func $mb (param i32) (result i32)))
            (func (export "down") (param i32 i32) (result i32) (call $down (local.get 0) (local.get 1)))
            (func (export "htc") (param i32 i32) (result i32) (call $htc (local.get 0) (local.get 1)))
            (func (export "sx") (param i32) (result f32) (call $sx (local.get 0)))
            (func (export "mb") (param i32) (result i32) (call $mb (local.get 0))))
        "#,
    );

    {
        let input = &mut host.store.data_mut().input;
        let pad = input.controller_mut(2).unwrap();
        pad.stick_x = -0.5;
        let jump = pad.button_mut(Button::FaceDown);
        jump.set_down(true);
        jump.half_transition_count = 3;
        input.mouse_buttons[1].set_down(true);
    }

    let down = instance
        .get_typed_func::<(u32, u32), u32>(&mut host.store, "down")
        .unwrap();
    let htc = instance
        .get_typed_func::<(u32, u32), u32>(&mut host.store, "htc")
        .unwrap();
    let sx = instance
        .get_typed_func::<u32, f32>(&mut host.store, "sx")
        .unwrap();
    let mb = instance
        .get_typed_func::<u32, u32>(&mut host.store, "mb")
        .unwrap();

    assert_eq!(down.call(&mut host.store, (2, 7)).unwrap(), 1);
    assert_eq!(htc.call(&mut host.store, (2, 7)).unwrap(), 3);
    assert_eq!(down.call(&mut host.store, (0, 7)).unwrap(), 0);
    assert_eq!(sx.call(&mut host.store, 2).unwrap(), -0.5);
    assert_eq!(mb.call(&mut host.store, 1).unwrap(), 1);

    // Out of range reads as released
    assert_eq!(down.call(&mut host.store, (9, 0)).unwrap(), 0);
    assert_eq!(down.call(&mut host.store, (0, 99)).unwrap(), 0);
    assert_eq!(sx.call(&mut host.store, 5).unwrap(), 0.0);
    assert_eq!(mb.call(&mut host.store, 5).unwrap(), 0);
}

// ============================================================================
// Frame buffer and sound
// ============================================================================

#[test]
fn test_frame_buffer_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = test_host(dir.path());
    let instance = host.instantiate(
        r#"
        (module
            (import "env" "memory" (memory 1))
            (import "env" "frame_put_pixel" (func $put (param i32 i32 i32)))
            (import "env" "frame_write_row" (func $row (param i32 i32) (result i32)))
            (data (i32.const 0) "\01\02\03\04\05\06\07\08\09\0a\0b\0c\0d\0e\0f\10")
            (func (export "draw") (result i32)
                (call $put (i32.const 3) (i32.const 0) (i32.const 0x00ff0000))
                (call $put (i32.const 99) (i32.const 0) (i32.const 1))
                (call $row (i32.const 1) (i32.const 0))))
        "#,
    );

    let draw = instance
        .get_typed_func::<(), u32>(&mut host.store, "draw")
        .unwrap();
    assert_eq!(draw.call(&mut host.store, ()).unwrap(), 1);

    let frame = &host.store.data().frame;
    assert_eq!(frame.pixel(3, 0), Some(0x00ff_0000));
    assert_eq!(frame.pixel(0, 1), Some(0x0403_0201));
    assert_eq!(frame.pixel(3, 1), Some(0x100f_0e0d));
}

#[test]
fn test_sound_window_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = test_host(dir.path());
    let instance = host.instantiate(
        r#"
        (module
            (import "env" "memory" (memory 1))
            (import "env" "sound_output_sample" (func $out (param i32 i32)))
            (import "env" "sound_write_samples" (func $write (param i32 i32) (result i32)))
            (data (i32.const 0) "\01\00\02\00\03\00\04\00")
            (func (export "fill") (result i32)
                (call $out (i32.const -1) (i32.const 1))
                (call $write (i32.const 0) (i32.const 2))))
        "#,
    );

    host.store.data_mut().sound.prepare(2, 48_000);
    let fill = instance
        .get_typed_func::<(), u32>(&mut host.store, "fill")
        .unwrap();

    // Only one pair of room remains after the single sample
    assert_eq!(fill.call(&mut host.store, ()).unwrap(), 1);
    assert_eq!(host.store.data().sound.samples(), &[-1, 1, 1, 2]);
    assert_eq!(host.store.data().sound.written(), 2);
}

// ============================================================================
// File services
// ============================================================================

#[test]
fn test_file_round_trip_through_arena() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.txt"), b"hello").unwrap();
    let mut host = test_host(dir.path());
    let instance = host.instantiate(
        r#"
        (module
            (import "env" "memory" (memory 1))
            (import "env" "read_entire_file" (func $read (param i32 i32) (result i32)))
            (import "env" "file_size" (func $size (param i32) (result i32)))
            (import "env" "file_copy" (func $copy (param i32 i32) (result i32)))
            (import "env" "free_file_memory" (func $free (param i32)))
            (import "env" "write_entire_file" (func $write (param i32 i32 i32 i32) (result i32)))
            (data (i32.const 0) "in.txt")
            (data (i32.const 16) "out.txt")
            (func (export "run") (result i32)
                (local $h i32)
                (local $n i32)
                (local.set $h (call $read (i32.const 0) (i32.const 6)))
                (local.set $n (call $size (local.get $h)))
                (drop (call $copy (local.get $h) (i32.const 64)))
                (call $free (local.get $h))
                (call $write (i32.const 16) (i32.const 7) (i32.const 64) (local.get $n))))
        "#,
    );

    let run = instance
        .get_typed_func::<(), u32>(&mut host.store, "run")
        .unwrap();
    assert_eq!(run.call(&mut host.store, ()).unwrap(), 1);
    assert_eq!(std::fs::read(dir.path().join("out.txt")).unwrap(), b"hello");
    assert_eq!(host.store.data().files.open_count(), 0);
}

#[test]
fn test_file_failures_return_zero() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = test_host(dir.path());
    let instance = host.instantiate(
        r#"
        (module
            (import "env" "memory" (memory 1))
            (import "env" "read_entire_file" (func $read (param i32 i32) (result i32)))
            (import "env" "file_size" (func $size (param i32) (result i32)))
            (data (i32.const 0) "../escape")
            (func (export "missing") (result i32) (call $read (i32.const 0) (i32.const 9)))
            (func (export "bad_ptr") (result i32) (call $read (i32.const -16) (i32.const 64)))
            (func (export "size") (result i32) (call $size (i32.const 42))))
        "#,
    );

    for name in ["missing", "bad_ptr", "size"] {
        let f = instance
            .get_typed_func::<(), u32>(&mut host.store, name)
            .unwrap();
        assert_eq!(f.call(&mut host.store, ()).unwrap(), 0, "{name}");
    }
}
