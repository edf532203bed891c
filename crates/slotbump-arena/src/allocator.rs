//! The allocator façade.
//!
//! [`Allocator`] composes an [`Arena`] and a [`SlotTable`] behind a
//! handle-based API. Client code never sees an offset or a reference that
//! outlives a borrow of the allocator; it holds [`Handle`]s and resolves
//! them on every access, so a stale handle is an error rather than a
//! dangling pointer.
//!
//! The lifecycle per allocation is:
//! 1. `allocate()`: acquire a slot, stamp it alive, pack a handle
//! 2. `resolve()` / `get()`: check the generation, borrow the bytes
//! 3. `free()`: check the generation, release the slot (generation + 1)
//!
//! `reset()` ends every allocation at once.

use std::fmt;
use std::ops::Range;

use slotbump_core::{AllocError, Generation, Handle, HandleLayout, SlotIndex};

use crate::arena::Arena;
use crate::config::AllocatorConfig;
use crate::slot::{Release, Slot, SlotTable};

/// Point-in-time usage figures for an [`Allocator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Arena size in bytes.
    pub capacity: usize,
    /// Bump offset, including alignment padding.
    pub bytes_used: usize,
    /// Slots holding a live allocation.
    pub live_slots: usize,
    /// Slots on the free list.
    pub free_slots: usize,
    /// Slots retired after exhausting their generation counter.
    pub retired_slots: usize,
    /// All slots ever created.
    pub total_slots: usize,
    /// Number of resets performed.
    pub resets: u64,
}

/// Generation-checked bump allocator over a fixed-capacity arena.
///
/// Single-threaded: every mutating operation takes `&mut self`, so the
/// borrow checker rules out concurrent use. The type is `Send`; callers
/// that need sharing wrap it in a mutex or keep one allocator per thread.
pub struct Allocator {
    arena: Arena,
    slots: SlotTable,
    layout: HandleLayout,
    config: AllocatorConfig,
    resets: u64,
}

impl Allocator {
    /// Create an allocator over `capacity` bytes with default settings.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` plus the default alignment padding overflows
    /// `usize`. Use [`Allocator::with_config`] to get an error instead.
    pub fn new(capacity: usize) -> Self {
        let config = AllocatorConfig::new(capacity);
        assert!(
            capacity.checked_add(config.max_align - 1).is_some(),
            "arena capacity {capacity} overflows usize once padded"
        );
        Self::build(config, HandleLayout::default())
    }

    /// Create an allocator from a validated config.
    ///
    /// Returns `Err(AllocError::InvalidConfig)` if any field is out of range.
    pub fn with_config(config: AllocatorConfig) -> Result<Self, AllocError> {
        let layout = config.validate()?;
        Ok(Self::build(config, layout))
    }

    fn build(config: AllocatorConfig, layout: HandleLayout) -> Self {
        Self {
            arena: Arena::new(config.capacity, config.max_align),
            slots: SlotTable::new(layout),
            layout,
            config,
            resets: 0,
        }
    }

    /// Allocate `size` bytes aligned to `align`.
    ///
    /// Reuses the lowest-indexed free slot whose block fits, otherwise bumps
    /// the arena. The returned handle carries the slot's current generation,
    /// which is strictly greater than that of any handle previously issued
    /// for the same slot.
    ///
    /// Returns `Err(AllocError::InvalidAlignment)` if `align` is not a power
    /// of two or exceeds `max_align`, `Err(AllocError::OutOfMemory)` if the
    /// arena is full, and `Err(AllocError::CapacityExceeded)` if the slot
    /// table cannot grow. On error nothing changes.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<Handle, AllocError> {
        let index = self.slots.acquire(size, align, &mut self.arena)?;
        let slot = self.slots.slot(index);
        let (generation, range) = (slot.generation(), slot.range().unwrap_or(0..0));
        // Cannot fail: the table never outgrows the layout's index or
        // generation fields.
        let handle = self.layout.encode(index, generation)?;
        if self.config.zero_on_allocate {
            self.arena.bytes_mut(range).fill(0);
        }
        tracing::trace!(
            slot = index.0,
            generation = generation.0,
            size,
            align,
            "allocate"
        );
        Ok(handle)
    }

    /// Allocate a block sized to `bytes` and copy them in.
    pub fn allocate_slice(&mut self, bytes: &[u8], align: usize) -> Result<Handle, AllocError> {
        let handle = self.allocate(bytes.len(), align)?;
        self.resolve(handle)?.copy_from_slice(bytes);
        Ok(handle)
    }

    /// Borrow the bytes of a live allocation mutably.
    ///
    /// The slice is exactly as long as the `size` passed to `allocate` and
    /// starts at an address aligned to the requested alignment.
    ///
    /// Returns `Err(AllocError::InvalidHandle)` if the handle's index is
    /// outside the slot table or the token is malformed, and
    /// `Err(AllocError::UseAfterFree)` if the allocation has been freed or
    /// reset.
    pub fn resolve(&mut self, handle: Handle) -> Result<&mut [u8], AllocError> {
        let range = self.range(handle)?;
        Ok(self.arena.bytes_mut(range))
    }

    /// Borrow the bytes of a live allocation.
    ///
    /// Same checks as [`Allocator::resolve`].
    pub fn get(&self, handle: Handle) -> Result<&[u8], AllocError> {
        let range = self.range(handle)?;
        Ok(self.arena.bytes(range))
    }

    /// Byte range of a live allocation within the arena.
    ///
    /// Same checks as [`Allocator::resolve`].
    pub fn range(&self, handle: Handle) -> Result<Range<usize>, AllocError> {
        let (index, generation, slot) = self.lookup(handle)?;
        match slot.range() {
            Some(range) if slot.generation() == generation => Ok(range),
            _ => Err(AllocError::UseAfterFree {
                index,
                handle_generation: generation,
                slot_generation: slot.generation(),
            }),
        }
    }

    /// Whether `handle` refers to a live allocation.
    pub fn contains(&self, handle: Handle) -> bool {
        self.range(handle).is_ok()
    }

    /// Free a live allocation.
    ///
    /// The slot's generation advances, so every copy of `handle` becomes
    /// stale. If the counter is exhausted the slot is retired instead; this
    /// is logged once and counted in [`AllocatorStats::retired_slots`], and
    /// the free still succeeds.
    ///
    /// Returns `Err(AllocError::DoubleFree)` if `handle` is the handle most
    /// recently freed on its slot (and no reset has happened since),
    /// `Err(AllocError::UseAfterFree)` for any other stale handle, and
    /// `Err(AllocError::InvalidHandle)` for an index outside the table or a
    /// token this allocator's layout could not have produced.
    pub fn free(&mut self, handle: Handle) -> Result<(), AllocError> {
        let (index, generation, slot) = self.lookup(handle)?;
        if slot.last_freed() == Some(generation) {
            return Err(AllocError::DoubleFree { index, generation });
        }
        if slot.generation() != generation || !slot.is_alive() {
            return Err(AllocError::UseAfterFree {
                index,
                handle_generation: generation,
                slot_generation: slot.generation(),
            });
        }
        let outcome = self.slots.release(index)?;
        tracing::trace!(
            slot = index.0,
            generation = generation.0,
            retired = outcome == Release::Retired,
            "free"
        );
        Ok(())
    }

    /// Invalidate every outstanding handle and rewind the arena.
    ///
    /// Every slot's generation advances and every slot becomes free with no
    /// block; the arena cursor returns to zero. Slot indices are reused by
    /// later allocations, so the table does not grow across resets. Arena
    /// bytes are not cleared.
    pub fn reset(&mut self) {
        let reclaimed = self.arena.offset();
        let invalidated = self.slots.bump_all_generations();
        self.arena.reset();
        self.resets += 1;
        tracing::debug!(
            invalidated,
            reclaimed,
            slots = self.slots.len(),
            "allocator reset"
        );
    }

    /// Bytes consumed from the arena, including alignment padding.
    pub fn bytes_used(&self) -> usize {
        self.arena.offset()
    }

    /// Arena size in bytes.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Number of live allocations.
    pub fn live_count(&self) -> usize {
        self.slots.live_count()
    }

    /// Current usage figures.
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            capacity: self.arena.capacity(),
            bytes_used: self.arena.offset(),
            live_slots: self.slots.live_count(),
            free_slots: self.slots.free_count(),
            retired_slots: self.slots.retired_count(),
            total_slots: self.slots.len(),
            resets: self.resets,
        }
    }

    /// The handle bit layout in use.
    pub fn layout(&self) -> HandleLayout {
        self.layout
    }

    /// The configuration this allocator was built with.
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    fn lookup(&self, handle: Handle) -> Result<(SlotIndex, Generation, &Slot), AllocError> {
        if !self.layout.is_canonical(handle) {
            return Err(AllocError::InvalidHandle { handle });
        }
        let (index, generation) = self.layout.decode(handle);
        let slot = self
            .slots
            .get(index)
            .ok_or(AllocError::InvalidHandle { handle })?;
        Ok((index, generation, slot))
    }
}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("layout", &self.layout)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
