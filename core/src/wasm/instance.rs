//! Instantiated logic module

use anyhow::{Context, Result};
use hotloop_shared::{GET_SOUND_SAMPLES_EXPORT, UPDATE_AND_RENDER_EXPORT};
use wasmtime::{Instance, Linker, Module, Store, TypedFunc};

use super::engine::WasmEngine;
use super::state::HostContext;

/// A logic module with both entry points resolved
pub struct LogicInstance {
    /// Keeps the exported functions' instance referenced for the unit's lifetime.
    #[allow(dead_code)]
    instance: Instance,
    update_and_render: TypedFunc<(), ()>,
    get_sound_samples: TypedFunc<(), ()>,
}

impl LogicInstance {
    /// Instantiate `module` and resolve both entry points
    ///
    /// Fails if either export is missing or has the wrong signature. The
    /// exports are checked before instantiation, which would otherwise apply
    /// the module's data segments to the shared arena.
    pub fn instantiate(
        store: &mut Store<HostContext>,
        linker: &Linker<HostContext>,
        module: &Module,
    ) -> Result<Self> {
        WasmEngine::validate_entry_points(module)?;
        let instance = linker
            .instantiate(&mut *store, module)
            .context("Failed to instantiate logic module")?;

        let update_and_render = instance
            .get_typed_func::<(), ()>(&mut *store, UPDATE_AND_RENDER_EXPORT)
            .with_context(|| format!("Missing entry point '{}'", UPDATE_AND_RENDER_EXPORT))?;
        let get_sound_samples = instance
            .get_typed_func::<(), ()>(&mut *store, GET_SOUND_SAMPLES_EXPORT)
            .with_context(|| format!("Missing entry point '{}'", GET_SOUND_SAMPLES_EXPORT))?;

        Ok(Self {
            instance,
            update_and_render,
            get_sound_samples,
        })
    }

    /// Call the module's update/render entry point
    pub fn update_and_render(&self, store: &mut Store<HostContext>) -> Result<()> {
        self.update_and_render
            .call(store, ())
            .with_context(|| format!("WASM {}() failed", UPDATE_AND_RENDER_EXPORT))
    }

    /// Call the module's audio entry point
    pub fn get_sound_samples(&self, store: &mut Store<HostContext>) -> Result<()> {
        self.get_sound_samples
            .call(store, ())
            .with_context(|| format!("WASM {}() failed", GET_SOUND_SAMPLES_EXPORT))
    }
}
