//! Shared test utilities for integration and unit tests

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use wasmtime::{Instance, Linker, Store};

use crate::arena::{Arena, ArenaLayout};
use crate::audio::{SimulatedDevice, SoundOutput};
use crate::code_host::{CodeHost, CodePaths};
use crate::files::FileServices;
use crate::framebuffer::FrameBuffer;
use crate::input::{Button, InputFrame, process_key_event};
use crate::replay::ReplayEngine;
use crate::runtime::{HostCommand, PlatformHooks, Runtime, RuntimeConfig};
use crate::wasm::{HostContext, WasmEngine};

// ============================================================================
// Arena and store fixtures
// ============================================================================

/// Small arena: 1 KiB module region, 32 KiB permanent, 32 KiB transient (2 pages).
pub fn test_layout() -> ArenaLayout {
    ArenaLayout::new(1024, 32 * 1024, 32 * 1024).unwrap()
}

/// A store with the arena allocated and every host import linked.
pub struct TestHost {
    pub engine: WasmEngine,
    pub linker: Linker<HostContext>,
    pub store: Store<HostContext>,
    pub arena: Arena,
}

pub fn test_host(files_root: &Path) -> TestHost {
    let engine = WasmEngine::new().unwrap();
    let layout = test_layout();
    let context = HostContext::new(layout, FrameBuffer::new(4, 2), FileServices::new(files_root));
    let mut store = Store::new(engine.engine(), context);
    let arena = Arena::create(&mut store, layout).unwrap();
    store.data_mut().memory = Some(arena.memory());

    let mut linker = Linker::new(engine.engine());
    crate::ffi::register_host_ffi(&mut linker).unwrap();
    linker.define(&store, "env", "memory", arena.memory()).unwrap();

    TestHost {
        engine,
        linker,
        store,
        arena,
    }
}

impl TestHost {
    pub fn instantiate(&mut self, wat: &str) -> Instance {
        let wasm = wat::parse_str(wat).unwrap();
        let module = self.engine.load_module(&wasm).unwrap();
        self.linker.instantiate(&mut self.store, &module).unwrap()
    }
}

// ============================================================================
// Logic modules
// ============================================================================

/// Deterministic logic module
///
/// Permanent storage layout (little-endian i32s):
/// - `+0`: hash, `hash * 31 + mouse_x + step` each frame
/// - `+4`: frames updated
/// - `+8`: frames with the keyboard FaceDown button held
///
/// The audio entry point emits `step` on both channels for every requested pair.
pub fn counter_logic(step: i32) -> String {
    format!(
        r#"
        (module
            (import "env" "memory" (memory 1))
            (import "env" "permanent_storage" (func $perm (result i32)))
            (import "env" "mouse_x" (func $mouse_x (result i32)))
            (import "env" "button_ended_down" (func $down (param i32 i32) (result i32)))
            (import "env" "sound_sample_count" (func $count (result i32)))
            (import "env" "sound_output_sample" (func $out (param i32 i32)))

            (func (export "update_and_render")
                (local $p i32)
                (local.set $p (call $perm))
                (i32.store (local.get $p)
                    (i32.add
                        (i32.add
                            (i32.mul (i32.load (local.get $p)) (i32.const 31))
                            (call $mouse_x))
                        (i32.const {step})))
                (i32.store offset=4 (local.get $p)
                    (i32.add (i32.load offset=4 (local.get $p)) (i32.const 1)))
                (i32.store offset=8 (local.get $p)
                    (i32.add
                        (i32.load offset=8 (local.get $p))
                        (call $down (i32.const 0) (i32.const 7)))))

            (func (export "get_sound_samples")
                (local $i i32)
                (block $done
                    (loop $next
                        (br_if $done (i32.ge_u (local.get $i) (call $count)))
                        (call $out (i32.const {step}) (i32.const {step}))
                        (local.set $i (i32.add (local.get $i) (i32.const 1)))
                        (br $next)))))
        "#
    )
}

/// Logic module that only exports the update entry point.
pub const MISSING_AUDIO_LOGIC: &str = r#"
    (module
        (import "env" "memory" (memory 1))
        (func (export "update_and_render")))
"#;

/// Logic module whose update entry point traps.
pub const TRAPPING_LOGIC: &str = r#"
    (module
        (import "env" "memory" (memory 1))
        (func (export "update_and_render") unreachable)
        (func (export "get_sound_samples")))
"#;

/// Logic module that brings its own memory instead of importing the arena.
pub const OWN_MEMORY_LOGIC: &str = r#"
    (module
        (memory (export "memory") 1)
        (func (export "update_and_render"))
        (func (export "get_sound_samples")))
"#;

/// Logic module whose data segment lands on the start of the permanent
/// partition of [`test_layout`]. Otherwise complete.
pub const ARENA_DATA_LOGIC: &str = r#"
    (module
        (import "env" "memory" (memory 1))
        (data (i32.const 1024) "\ff\ff\ff\ff\ff\ff\ff\ff")
        (func (export "update_and_render"))
        (func (export "get_sound_samples")))
"#;

/// Same segment as [`ARENA_DATA_LOGIC`], but the audio entry point is missing.
pub const ARENA_DATA_MISSING_AUDIO_LOGIC: &str = r#"
    (module
        (import "env" "memory" (memory 1))
        (data (i32.const 1024) "\ff\ff\ff\ff\ff\ff\ff\ff")
        (func (export "update_and_render")))
"#;

/// Logic module with static data kept below the arena base.
pub const LOW_DATA_LOGIC: &str = r#"
    (module
        (import "env" "memory" (memory 1))
        (data (i32.const 16) "static")
        (func (export "update_and_render"))
        (func (export "get_sound_samples")))
"#;

/// Read the little-endian i32 at `offset` into the permanent partition.
pub fn read_permanent_i32(arena: &[u8], layout: &ArenaLayout, offset: usize) -> i32 {
    let bytes = &layout.permanent().slice(arena)[offset..offset + 4];
    i32::from_le_bytes(bytes.try_into().unwrap())
}

// ============================================================================
// Code host fixtures
// ============================================================================

/// Compile `wat` and write it to `path`.
pub fn write_logic(path: &Path, wat: &str) {
    std::fs::write(path, wat::parse_str(wat).unwrap()).unwrap();
}

/// Push a file's modification time forward so a reload poll sees a change
/// regardless of filesystem timestamp granularity.
pub fn bump_modified(path: &Path, seconds: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    let time = SystemTime::now() + Duration::from_secs(seconds);
    file.set_modified(time).unwrap();
}

/// Paths for a logic module inside `dir`.
pub fn test_code_paths(dir: &Path) -> CodePaths {
    CodePaths {
        source: dir.join("logic.wasm"),
        temp: dir.join("logic_temp.wasm"),
    }
}

/// A code host over `wat`, already loaded.
pub fn loaded_code_host(dir: &Path, wat: &str) -> CodeHost {
    let paths = test_code_paths(dir);
    write_logic(&paths.source, wat);
    let mut host = CodeHost::new(
        paths,
        test_layout(),
        FrameBuffer::new(4, 2),
        FileServices::new(dir),
    )
    .unwrap();
    host.load();
    host
}

/// Directory for replay files inside `dir`.
pub fn replay_dir(dir: &Path) -> PathBuf {
    dir.join("replays")
}

// ============================================================================
// Runtime fixtures
// ============================================================================

/// 500 Hz without sleeping, so paced tests stay fast.
pub fn test_runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        update_hz: 500,
        granular_sleep: false,
    }
}

/// 48 kHz stereo fed at 500 Hz: 384 bytes per frame, 192 safety bytes.
pub fn test_sound_output() -> SoundOutput {
    SoundOutput::new(48_000, 1, 500)
}

/// Write cursor lead of the simulated device used by [`test_runtime`].
pub const TEST_DEVICE_LATENCY: u32 = 3200;

/// A runtime over `wat` with two replay slots and a manual sound device.
pub fn test_runtime(dir: &Path, wat: &str) -> Runtime<SimulatedDevice> {
    let code = loaded_code_host(dir, wat);
    let replay = ReplayEngine::new(replay_dir(dir), 2, code.arena_bytes().len()).unwrap();
    let output = test_sound_output();
    let device =
        SimulatedDevice::manual(output.buffer_size, output.bytes_per_sample, TEST_DEVICE_LATENCY);
    Runtime::new(test_runtime_config(), code, replay, output, device, 1)
}

/// Platform hooks driven by a fixed script.
///
/// Each frame sets `mouse_x = frame * mouse_step`, presses the keyboard
/// FaceDown button on `press_face_down_at`, and emits the commands scheduled
/// for that frame.
#[derive(Debug, Default)]
pub struct ScriptedHooks {
    pub frame: u64,
    pub mouse_step: i32,
    pub press_face_down_at: Option<u64>,
    pub commands: Vec<(u64, HostCommand)>,
    pub presented: u64,
}

impl PlatformHooks for ScriptedHooks {
    fn process_input(
        &mut self,
        _previous: &InputFrame,
        current: &mut InputFrame,
        commands: &mut Vec<HostCommand>,
    ) {
        current.mouse_x = self.frame as i32 * self.mouse_step;
        if self.press_face_down_at == Some(self.frame) {
            process_key_event(current.keyboard_mut().button_mut(Button::FaceDown), true);
        }
        let frame = self.frame;
        commands.extend(
            self.commands
                .iter()
                .filter(|(at, _)| *at == frame)
                .map(|(_, command)| *command),
        );
        self.frame += 1;
    }

    fn present(&mut self, _frame: &FrameBuffer) {
        self.presented += 1;
    }
}
