//! Memory arena
//!
//! The arena is a single host-owned WebAssembly linear memory whose minimum
//! and maximum page counts are equal, so it can never grow or move. Every
//! logic module imports it as `env.memory`, which is what lets its contents
//! survive a code swap untouched.
//!
//! The logic module sees two partitions at fixed offsets:
//!
//! ```text
//! 0          base        base + permanent        base + permanent + transient
//! | module   | permanent  | transient             |
//! ```
//!
//! The region below `base` belongs to the logic module (stack and static
//! data). A replay snapshot covers the entire memory.

use std::ops::Range;

use anyhow::{Context, Result};
use hotloop_shared::{MAX_ARENA_BYTES, WASM_PAGE_SIZE};
use wasmtime::{Memory, MemoryType, Store};

/// Fixed placement of the two arena partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaLayout {
    pub base: u64,
    pub permanent_size: u64,
    pub transient_size: u64,
}

/// Offset handle for one arena partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start: u64,
    pub len: u64,
}

impl Partition {
    /// One past the last byte of the partition.
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    /// Borrow this partition out of a full arena image.
    pub fn slice<'a>(&self, arena: &'a [u8]) -> &'a [u8] {
        debug_assert!(
            self.end() as usize <= arena.len(),
            "partition {:?} outside arena of {} bytes",
            self,
            arena.len()
        );
        &arena[self.range()]
    }

    /// Mutably borrow this partition out of a full arena image.
    pub fn slice_mut<'a>(&self, arena: &'a mut [u8]) -> &'a mut [u8] {
        debug_assert!(
            self.end() as usize <= arena.len(),
            "partition {:?} outside arena of {} bytes",
            self,
            arena.len()
        );
        &mut arena[self.range()]
    }
}

impl ArenaLayout {
    /// Validate and build a layout.
    pub fn new(base: u64, permanent_size: u64, transient_size: u64) -> Result<Self> {
        let layout = Self {
            base,
            permanent_size,
            transient_size,
        };
        let total = base
            .checked_add(permanent_size)
            .and_then(|n| n.checked_add(transient_size))
            .context("Arena size overflows")?;
        if permanent_size == 0 {
            anyhow::bail!("Arena permanent partition must not be empty");
        }
        if layout.page_count_for(total) * WASM_PAGE_SIZE > MAX_ARENA_BYTES {
            anyhow::bail!(
                "Arena of {} bytes exceeds the {} byte limit of a 32-bit linear memory",
                total,
                MAX_ARENA_BYTES
            );
        }
        Ok(layout)
    }

    pub fn permanent(&self) -> Partition {
        Partition {
            start: self.base,
            len: self.permanent_size,
        }
    }

    pub fn transient(&self) -> Partition {
        Partition {
            start: self.base + self.permanent_size,
            len: self.transient_size,
        }
    }

    /// Bytes actually used by the module region and both partitions.
    pub fn used_bytes(&self) -> u64 {
        self.base + self.permanent_size + self.transient_size
    }

    /// Pages backing the arena (used bytes rounded up to whole pages).
    pub fn page_count(&self) -> u64 {
        self.page_count_for(self.used_bytes())
    }

    /// Size of the linear memory, and therefore of every snapshot.
    pub fn memory_bytes(&self) -> u64 {
        self.page_count() * WASM_PAGE_SIZE
    }

    fn page_count_for(&self, bytes: u64) -> u64 {
        bytes.div_ceil(WASM_PAGE_SIZE)
    }
}

/// The live arena: a fixed-size memory inside the host store.
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    memory: Memory,
    layout: ArenaLayout,
}

impl Arena {
    /// Allocate the arena inside `store`. Contents start zeroed.
    pub fn create<T: 'static>(store: &mut Store<T>, layout: ArenaLayout) -> Result<Self> {
        let pages = u32::try_from(layout.page_count()).context("Arena page count overflows")?;
        let memory = Memory::new(&mut *store, MemoryType::new(pages, Some(pages)))
            .context("Failed to allocate arena memory")?;
        tracing::debug!(
            pages,
            bytes = layout.memory_bytes(),
            "Allocated arena (permanent {} bytes, transient {} bytes)",
            layout.permanent_size,
            layout.transient_size
        );
        Ok(Self { memory, layout })
    }

    pub fn memory(&self) -> Memory {
        self.memory
    }

    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    /// The whole arena image.
    pub fn bytes<'a, T: 'static>(&self, store: &'a Store<T>) -> &'a [u8] {
        self.memory.data(store)
    }

    /// The whole arena image, mutably.
    pub fn bytes_mut<'a, T: 'static>(&self, store: &'a mut Store<T>) -> &'a mut [u8] {
        self.memory.data_mut(store)
    }
}
