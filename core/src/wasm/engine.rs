//! WASM engine wrapper for compiling and validating logic modules

use anyhow::{Context, Result};
use hotloop_shared::{GET_SOUND_SAMPLES_EXPORT, HOST_MODULE, UPDATE_AND_RENDER_EXPORT};
use wasmparser::{DataKind, Operator, Parser, Payload};
use wasmtime::{Engine, ExternType, Module};

use crate::arena::ArenaLayout;

/// Shared WASM engine (one per process)
pub struct WasmEngine {
    engine: Engine,
}

impl WasmEngine {
    /// Create a new WASM engine with default configuration
    pub fn new() -> Result<Self> {
        let engine = Engine::default();
        Ok(Self { engine })
    }

    /// Get a reference to the underlying wasmtime engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Compile a logic module from bytes
    pub fn load_module(&self, bytes: &[u8]) -> Result<Module> {
        Module::new(&self.engine, bytes).context("Failed to compile logic module")
    }

    /// Check that a module imports the arena instead of defining its own memory
    ///
    /// The module must import `env.memory` with a minimum no larger than the
    /// arena. A module that brings its own memory would lose all state on the
    /// next reload, so it is rejected before instantiation with a clear message.
    pub fn validate_arena_import(module: &Module, arena_pages: u64) -> Result<()> {
        let mut imports_arena = false;
        for import in module.imports() {
            if let ExternType::Memory(mem_type) = import.ty() {
                if import.module() != HOST_MODULE || import.name() != "memory" {
                    anyhow::bail!(
                        "Logic module imports memory '{}.{}'; it must import '{}.memory'",
                        import.module(),
                        import.name(),
                        HOST_MODULE
                    );
                }
                if mem_type.minimum() > arena_pages {
                    anyhow::bail!(
                        "Logic module requires {} pages of memory, but the arena has {}",
                        mem_type.minimum(),
                        arena_pages
                    );
                }
                imports_arena = true;
            }
        }

        if !imports_arena {
            anyhow::bail!(
                "Logic module must import its memory as '{}.memory'",
                HOST_MODULE
            );
        }
        Ok(())
    }

    /// Check that both entry points are exported as `() -> ()` functions
    ///
    /// Runs before instantiation, so a module that could never become ready
    /// is turned away without touching the store.
    pub fn validate_entry_points(module: &Module) -> Result<()> {
        for name in [UPDATE_AND_RENDER_EXPORT, GET_SOUND_SAMPLES_EXPORT] {
            match module.get_export(name) {
                Some(ExternType::Func(func))
                    if func.params().len() == 0 && func.results().len() == 0 => {}
                Some(_) => anyhow::bail!("Entry point '{}' must be a function () -> ()", name),
                None => anyhow::bail!("Missing entry point '{}'", name),
            }
        }
        Ok(())
    }

    /// Check that no active data segment lands on the arena partitions
    ///
    /// Instantiation copies active segments into the shared memory, so a
    /// segment at or above `layout.base` would overwrite state the previous
    /// module left behind. Segment offsets must be constant; anything else
    /// cannot be checked up front and is rejected too.
    pub fn validate_data_segments(bytes: &[u8], layout: &ArenaLayout) -> Result<()> {
        for payload in Parser::new(0).parse_all(bytes) {
            let Payload::DataSection(reader) = payload.context("Failed to parse logic module")?
            else {
                continue;
            };
            for (index, data) in reader.into_iter().enumerate() {
                let data = data.context("Failed to parse data segment")?;
                let DataKind::Active { offset_expr, .. } = data.kind else {
                    continue;
                };
                let offset = match offset_expr.get_operators_reader().into_iter().next() {
                    Some(Ok(Operator::I32Const { value })) => u64::from(value as u32),
                    _ => anyhow::bail!(
                        "Data segment {} has a non-constant offset; only constant offsets are allowed",
                        index
                    ),
                };
                let end = offset + data.data.len() as u64;
                if end > layout.base {
                    anyhow::bail!(
                        "Data segment {} covers {:#x}..{:#x}, which reaches into the arena at {:#x}",
                        index,
                        offset,
                        end,
                        layout.base
                    );
                }
            }
        }
        Ok(())
    }
}

// WasmEngine does not implement Default: engine creation can fail on
// unsupported platforms, so construction goes through WasmEngine::new().
