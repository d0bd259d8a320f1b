//! Code host: loads, swaps and calls the logic module
//!
//! The host owns the wasmtime store, and with it the arena. Reloading only
//! replaces the [`CodeUnit`]; the store, the arena and the host context
//! carry over untouched, so every offset the logic module computed stays
//! valid in the new code.
//!
//! The source module is never loaded in place. It is first copied to a temp
//! path so the build that produces it can overwrite it at any time.


use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use hotloop_shared::fs::{MAX_LOGIC_BYTES, copy_replacing, modified_time, read_file_with_limit};
use hotloop_shared::HOST_MODULE;
use wasmtime::{Linker, Store};

use crate::arena::{Arena, ArenaLayout};
use crate::ffi::register_host_ffi;
use crate::files::FileServices;
use crate::framebuffer::FrameBuffer;
use crate::input::InputFrame;
use crate::wasm::{HostContext, LogicInstance, WasmEngine};

/// Where the logic module is built and where the host loads it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePaths {
    pub source: PathBuf,
    pub temp: PathBuf,
}

/// The currently loaded logic, if both entry points resolved.
pub enum CodeUnit {
    /// Nothing callable: every entry point call has no effect.
    Unresolved,
    Ready(LogicInstance),
}

/// True iff the source's modification time differs from `cached`.
///
/// A missing source reads as "no time", so a module appearing or
/// disappearing also counts as a change.
pub fn poll_for_change(source: &Path, cached: Option<SystemTime>) -> bool {
    modified_time(source) != cached
}

/// Owner of the store, the arena and the current [`CodeUnit`].
///
/// wasmtime cannot free an instance out of a live store, and the store has
/// to outlive every reload because it owns the arena. Each successful load
/// therefore leaves the superseded instance (its tables, globals and
/// compiled code) in the store until the host exits. [`CodeHost::load_count`]
/// is the number of instances held that way.
pub struct CodeHost {
    engine: WasmEngine,
    linker: Linker<HostContext>,
    store: Store<HostContext>,
    arena: Arena,
    unit: CodeUnit,
    paths: CodePaths,
    last_write_time: Option<SystemTime>,
    load_count: u64,
}

impl CodeHost {
    /// Create the store, allocate the arena and link the host imports.
    ///
    /// No logic is loaded yet; call [`CodeHost::load`].
    pub fn new(
        paths: CodePaths,
        layout: ArenaLayout,
        frame: FrameBuffer,
        files: FileServices,
    ) -> Result<Self> {
        let engine = WasmEngine::new()?;
        let mut store = Store::new(engine.engine(), HostContext::new(layout, frame, files));
        let arena = Arena::create(&mut store, layout)?;
        store.data_mut().memory = Some(arena.memory());

        let mut linker = Linker::new(engine.engine());
        register_host_ffi(&mut linker).context("Failed to register host functions")?;
        linker
            .define(&store, HOST_MODULE, "memory", arena.memory())
            .context("Failed to link arena memory")?;

        Ok(Self {
            engine,
            linker,
            store,
            arena,
            unit: CodeUnit::Unresolved,
            paths,
            last_write_time: None,
            load_count: 0,
        })
    }

    /// Copy the source to the temp path, load it and resolve both entry points.
    ///
    /// The source's modification time is captured before anything else, so a
    /// failed load is only retried once the source changes again. Returns
    /// whether the unit ended up valid.
    pub fn load(&mut self) -> bool {
        self.last_write_time = modified_time(&self.paths.source);
        match self.instantiate_temp_copy() {
            Ok(logic) => {
                self.unit = CodeUnit::Ready(logic);
                self.load_count += 1;
                tracing::info!(
                    load_count = self.load_count,
                    "Loaded logic module {}",
                    self.paths.source.display()
                );
                true
            }
            Err(e) => {
                self.unit = CodeUnit::Unresolved;
                tracing::warn!("Logic module unavailable: {:#}", e);
                false
            }
        }
    }

    fn instantiate_temp_copy(&mut self) -> Result<LogicInstance> {
        copy_replacing(&self.paths.source, &self.paths.temp)?;
        let bytes = read_file_with_limit(&self.paths.temp, MAX_LOGIC_BYTES)?;
        let module = self.engine.load_module(&bytes)?;
        WasmEngine::validate_arena_import(&module, self.arena.layout().page_count())?;
        WasmEngine::validate_data_segments(&bytes, self.arena.layout())?;
        LogicInstance::instantiate(&mut self.store, &self.linker, &module)
    }

    /// Drop the loaded logic. The arena is left as is.
    pub fn unload(&mut self) {
        if matches!(self.unit, CodeUnit::Ready(_)) {
            tracing::debug!(
                retained_instances = self.load_count,
                "Unloaded logic module; its instance stays in the store"
            );
        }
        self.unit = CodeUnit::Unresolved;
    }

    pub fn poll_for_change(&self) -> bool {
        poll_for_change(&self.paths.source, self.last_write_time)
    }

    /// Unload and load again if the source changed. Call between frames only.
    pub fn reload_if_changed(&mut self) -> bool {
        if !self.poll_for_change() {
            return false;
        }
        self.unload();
        self.load();
        true
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.unit, CodeUnit::Ready(_))
    }

    pub fn unit(&self) -> &CodeUnit {
        &self.unit
    }

    /// Number of successful loads so far, which is also the number of
    /// instances the store keeps alive.
    pub fn load_count(&self) -> u64 {
        self.load_count
    }

    pub fn last_write_time(&self) -> Option<SystemTime> {
        self.last_write_time
    }

    pub fn paths(&self) -> &CodePaths {
        &self.paths
    }

    /// Run the update/render entry point against `input`.
    ///
    /// Returns false when nothing ran to completion: the unit is unresolved
    /// or the call trapped. Either way the frame simply has no logic effect.
    pub fn update_and_render(&mut self, input: &InputFrame) -> bool {
        let CodeUnit::Ready(logic) = &self.unit else {
            return false;
        };
        self.store.data_mut().input = *input;
        match logic.update_and_render(&mut self.store) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{:#}", e);
                false
            }
        }
    }

    /// Ask the audio entry point for `sample_count` stereo pairs.
    ///
    /// The window is zeroed first, so an unresolved unit yields silence.
    pub fn get_sound_samples(&mut self, sample_count: u32, samples_per_second: u32) -> &[i16] {
        self.store
            .data_mut()
            .sound
            .prepare(sample_count, samples_per_second);
        if let CodeUnit::Ready(logic) = &self.unit
            && let Err(e) = logic.get_sound_samples(&mut self.store)
        {
            tracing::warn!("{:#}", e);
        }
        self.store.data().sound.samples()
    }

    pub fn layout(&self) -> &ArenaLayout {
        self.arena.layout()
    }

    /// The whole arena image (snapshot unit).
    pub fn arena_bytes(&self) -> &[u8] {
        self.arena.bytes(&self.store)
    }

    pub fn arena_bytes_mut(&mut self) -> &mut [u8] {
        self.arena.bytes_mut(&mut self.store)
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.store.data().frame
    }

    pub fn context(&self) -> &HostContext {
        self.store.data()
    }

    pub fn context_mut(&mut self) -> &mut HostContext {
        self.store.data_mut()
    }
}
