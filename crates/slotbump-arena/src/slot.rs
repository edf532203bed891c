//! Slot table: per-allocation generation and liveness tracking.
//!
//! Every allocation lives in a [`Slot`]. Slots are appended on demand and
//! never removed; only their state and generation cycle:
//!
//! ```text
//!          acquire            release
//!   Free ───────────▶ Alive ───────────▶ Free (generation + 1)
//!                       │
//!                       └── reset ─────▶ Free (generation + 1, block dropped)
//!
//!   any non-retired ── counter exhausted ──▶ Retired (terminal)
//! ```
//!
//! A slot keeps its arena block across generations so a freed slot can be
//! handed out again without bumping the arena. `reset` drops every block
//! because the arena cursor goes back to zero.

use std::collections::BTreeSet;
use std::ops::Range;

use slotbump_core::{AllocError, Generation, HandleLayout, SlotIndex};
use smallvec::SmallVec;

use crate::arena::Arena;

/// Lifecycle state of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Available for reuse.
    Free,
    /// Holds a live allocation.
    Alive,
    /// Generation counter exhausted; never reused.
    Retired,
}

/// A byte range reserved in the arena for one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Start offset within the arena.
    pub offset: usize,
    /// Bytes reserved. Reuse accepts requests up to this size.
    pub capacity: usize,
}

/// A single allocation record.
#[derive(Clone, Debug)]
pub struct Slot {
    generation: Generation,
    state: SlotState,
    /// Arena range owned by this slot, `None` after a reset or retirement.
    block: Option<Block>,
    /// Bytes requested by the live allocation.
    len: usize,
    /// Generation of the handle most recently released by `free`.
    /// Cleared by reset.
    last_freed: Option<Generation>,
}

impl Slot {
    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Current state.
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Whether the slot holds a live allocation.
    pub fn is_alive(&self) -> bool {
        self.state == SlotState::Alive
    }

    /// The arena block owned by this slot, if any.
    pub fn block(&self) -> Option<Block> {
        self.block
    }

    /// Bytes requested by the live allocation (0 when not alive).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the live allocation is zero-sized.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Generation of the handle last released by `free`, if no reset has
    /// happened since.
    pub fn last_freed(&self) -> Option<Generation> {
        self.last_freed
    }

    /// Arena range of the live allocation: exactly `len` bytes.
    pub fn range(&self) -> Option<Range<usize>> {
        match (self.state, self.block) {
            (SlotState::Alive, Some(b)) => Some(b.offset..b.offset + self.len),
            _ => None,
        }
    }
}

/// What [`SlotTable::release`] did with the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// Returned to the free list with a new generation.
    Recycled,
    /// Counter exhausted; the slot is permanently out of service.
    Retired,
}

/// Tracks every slot and the free list.
///
/// Reuse policy is first-fit over free slots in ascending index order: the
/// lowest-indexed free slot whose block is large enough and suitably
/// aligned wins. When none fits, a block is reserved from the arena, either
/// for a free slot that lost its block in a reset or for a new slot.
pub struct SlotTable {
    /// All slots ever created, indexed by `SlotIndex`.
    slots: Vec<Slot>,
    /// Indices of free slots, ascending.
    free: BTreeSet<u32>,
    /// Slots taken out of service by counter exhaustion.
    retired: SmallVec<[SlotIndex; 4]>,
    /// Number of live slots.
    live: usize,
    /// Index field capacity of the handle layout.
    max_slots: u64,
    /// Largest generation the handle layout can carry.
    max_generation: Generation,
}

impl SlotTable {
    /// Create an empty table sized to `layout`'s field widths.
    pub fn new(layout: HandleLayout) -> Self {
        Self {
            slots: Vec::new(),
            free: BTreeSet::new(),
            retired: SmallVec::new(),
            live: 0,
            max_slots: layout.max_slots(),
            max_generation: layout.max_generation(),
        }
    }

    /// Acquire a slot for `size` bytes aligned to `align`, marking it alive.
    ///
    /// Tries, in order: a free slot whose block fits; a free slot with no
    /// block, rebound to a fresh arena reservation; a new slot. Returns
    /// `Err(AllocError::CapacityExceeded)` if a new slot is needed and the
    /// index field is full, or the arena's error if reservation fails. On
    /// error neither the table nor the arena changes.
    pub fn acquire(
        &mut self,
        size: usize,
        align: usize,
        arena: &mut Arena,
    ) -> Result<SlotIndex, AllocError> {
        // A reused block must satisfy the same alignment contract as a fresh one.
        arena.check_align(align)?;

        if let Some(index) = self.first_fit(size, align) {
            self.activate(index, None, size);
            return Ok(index);
        }

        if let Some(index) = self.first_unbacked() {
            let offset = arena.reserve(size, align)?;
            let block = Block {
                offset,
                capacity: size,
            };
            self.activate(index, Some(block), size);
            return Ok(index);
        }

        let next = self.slots.len() as u64;
        if next >= self.max_slots {
            return Err(AllocError::CapacityExceeded {
                requested: next + 1,
                limit: self.max_slots,
            });
        }
        let offset = arena.reserve(size, align)?;
        self.slots.push(Slot {
            generation: Generation::ZERO,
            state: SlotState::Alive,
            block: Some(Block {
                offset,
                capacity: size,
            }),
            len: size,
            last_freed: None,
        });
        self.live += 1;
        Ok(SlotIndex(next as u32))
    }

    /// Release a live slot: advance its generation and push it on the free
    /// list, or retire it if the generation counter is exhausted.
    ///
    /// Returns `Err(AllocError::DoubleFree)` if the slot is not alive.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the table.
    pub fn release(&mut self, index: SlotIndex) -> Result<Release, AllocError> {
        let max = self.max_generation;
        let slot = &mut self.slots[index.as_usize()];
        if slot.state != SlotState::Alive {
            return Err(AllocError::DoubleFree {
                index,
                generation: slot.generation,
            });
        }
        slot.last_freed = Some(slot.generation);
        slot.len = 0;
        self.live -= 1;
        match slot.generation.next(max) {
            Some(next) => {
                slot.generation = next;
                slot.state = SlotState::Free;
                self.free.insert(index.0);
                Ok(Release::Recycled)
            }
            None => {
                slot.state = SlotState::Retired;
                slot.block = None;
                log_retired(index, slot.generation);
                self.retired.push(index);
                Ok(Release::Retired)
            }
        }
    }

    /// Free every slot and advance every generation, dropping all blocks.
    ///
    /// Used by reset: after this call no previously issued handle matches
    /// its slot, and every non-retired slot is on the free list waiting for
    /// a fresh block. Returns the number of slots that were alive.
    pub fn bump_all_generations(&mut self) -> usize {
        let max = self.max_generation;
        let was_live = self.live;
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.state == SlotState::Retired {
                continue;
            }
            let index = SlotIndex(i as u32);
            slot.block = None;
            slot.len = 0;
            slot.last_freed = None;
            match slot.generation.next(max) {
                Some(next) => {
                    slot.generation = next;
                    slot.state = SlotState::Free;
                    self.free.insert(index.0);
                }
                None => {
                    slot.state = SlotState::Retired;
                    log_retired(index, slot.generation);
                    self.retired.push(index);
                }
            }
        }
        self.live = 0;
        was_live
    }

    /// Borrow a slot by index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the table.
    pub fn slot(&self, index: SlotIndex) -> &Slot {
        &self.slots[index.as_usize()]
    }

    /// Look up a slot.
    pub fn get(&self, index: SlotIndex) -> Option<&Slot> {
        self.slots.get(index.as_usize())
    }

    /// Total slots (free, alive, and retired).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has ever been created.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of alive slots.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of free slots available for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of retired slots.
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Slots retired so far, in retirement order.
    pub fn retired(&self) -> &[SlotIndex] {
        &self.retired
    }

    fn first_fit(&self, size: usize, align: usize) -> Option<SlotIndex> {
        self.free
            .iter()
            .copied()
            .find(|&i| {
                self.slots[i as usize]
                    .block
                    .is_some_and(|b| b.capacity >= size && b.offset & (align - 1) == 0)
            })
            .map(SlotIndex)
    }

    fn first_unbacked(&self) -> Option<SlotIndex> {
        self.free
            .iter()
            .copied()
            .find(|&i| self.slots[i as usize].block.is_none())
            .map(SlotIndex)
    }

    /// Mark a free slot alive, optionally binding a new block.
    fn activate(&mut self, index: SlotIndex, block: Option<Block>, len: usize) {
        self.free.remove(&index.0);
        let slot = &mut self.slots[index.as_usize()];
        debug_assert_eq!(slot.state, SlotState::Free);
        if block.is_some() {
            slot.block = block;
        }
        slot.state = SlotState::Alive;
        slot.len = len;
        self.live += 1;
    }
}

fn log_retired(index: SlotIndex, generation: Generation) {
    tracing::warn!(
        slot = index.0,
        generation = generation.0,
        "generation counter exhausted, slot retired"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table() -> (SlotTable, Arena) {
        (
            SlotTable::new(HandleLayout::default()),
            Arena::new(1024, 64),
        )
    }

    #[test]
    fn acquire_appends_new_slots() {
        let (mut table, mut arena) = make_table();
        let a = table.acquire(16, 8, &mut arena).unwrap();
        let b = table.acquire(16, 8, &mut arena).unwrap();
        assert_eq!(a, SlotIndex(0));
        assert_eq!(b, SlotIndex(1));
        assert_eq!(table.get(b).unwrap().range(), Some(16..32));
        assert_eq!(table.live_count(), 2);
        assert_eq!(arena.offset(), 32);
    }

    #[test]
    fn release_advances_generation_and_frees() {
        let (mut table, mut arena) = make_table();
        let a = table.acquire(8, 1, &mut arena).unwrap();
        assert_eq!(table.release(a), Ok(Release::Recycled));
        let slot = table.get(a).unwrap();
        assert_eq!(slot.generation(), Generation(1));
        assert_eq!(slot.state(), SlotState::Free);
        assert_eq!(slot.last_freed(), Some(Generation(0)));
        assert_eq!(slot.range(), None);
        assert_eq!(table.free_count(), 1);
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn release_of_free_slot_is_double_free() {
        let (mut table, mut arena) = make_table();
        let a = table.acquire(8, 1, &mut arena).unwrap();
        table.release(a).unwrap();
        assert_eq!(
            table.release(a),
            Err(AllocError::DoubleFree {
                index: a,
                generation: Generation(1)
            })
        );
    }

    #[test]
    fn freed_block_reused_without_bumping_arena() {
        let (mut table, mut arena) = make_table();
        let a = table.acquire(32, 8, &mut arena).unwrap();
        table.release(a).unwrap();
        let used = arena.offset();
        let b = table.acquire(20, 4, &mut arena).unwrap();
        assert_eq!(b, a);
        assert_eq!(arena.offset(), used);
        assert_eq!(table.get(b).unwrap().range(), Some(0..20));
    }

    #[test]
    fn first_fit_prefers_lowest_index() {
        let (mut table, mut arena) = make_table();
        let slots: Vec<_> = (0..4)
            .map(|_| table.acquire(16, 1, &mut arena).unwrap())
            .collect();
        table.release(slots[3]).unwrap();
        table.release(slots[1]).unwrap();
        assert_eq!(table.acquire(16, 1, &mut arena).unwrap(), SlotIndex(1));
        assert_eq!(table.acquire(16, 1, &mut arena).unwrap(), SlotIndex(3));
    }

    #[test]
    fn too_small_free_block_skipped() {
        let (mut table, mut arena) = make_table();
        let small = table.acquire(4, 1, &mut arena).unwrap();
        table.release(small).unwrap();
        let big = table.acquire(8, 1, &mut arena).unwrap();
        assert_eq!(big, SlotIndex(1));
        assert_eq!(table.free_count(), 1);
    }

    #[test]
    fn misaligned_free_block_skipped() {
        let (mut table, mut arena) = make_table();
        table.acquire(1, 1, &mut arena).unwrap();
        let odd = table.acquire(16, 1, &mut arena).unwrap();
        assert_eq!(table.get(odd).unwrap().block().unwrap().offset, 1);
        table.release(odd).unwrap();
        let aligned = table.acquire(8, 8, &mut arena).unwrap();
        assert_ne!(aligned, odd);
        assert_eq!(table.get(aligned).unwrap().block().unwrap().offset % 8, 0);
    }

    #[test]
    fn capacity_exceeded_at_index_limit() {
        let mut table = SlotTable::new(HandleLayout::new(2).unwrap());
        let mut arena = Arena::new(64, 8);
        for _ in 0..4 {
            table.acquire(1, 1, &mut arena).unwrap();
        }
        let offset = arena.offset();
        assert_eq!(
            table.acquire(1, 1, &mut arena),
            Err(AllocError::CapacityExceeded {
                requested: 5,
                limit: 4
            })
        );
        assert_eq!(arena.offset(), offset, "failed acquire must not bump the arena");
    }

    #[test]
    fn out_of_memory_leaves_table_unchanged() {
        let mut table = SlotTable::new(HandleLayout::default());
        let mut arena = Arena::new(8, 8);
        table.acquire(8, 1, &mut arena).unwrap();
        assert!(matches!(
            table.acquire(1, 1, &mut arena),
            Err(AllocError::OutOfMemory { .. })
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn bump_all_generations_frees_everything() {
        let (mut table, mut arena) = make_table();
        let a = table.acquire(8, 1, &mut arena).unwrap();
        let b = table.acquire(8, 1, &mut arena).unwrap();
        table.release(b).unwrap();
        assert_eq!(table.bump_all_generations(), 1);
        assert_eq!(table.get(a).unwrap().generation(), Generation(1));
        assert_eq!(table.get(b).unwrap().generation(), Generation(2));
        assert_eq!(table.get(b).unwrap().last_freed(), None);
        assert!(table.get(a).unwrap().block().is_none());
        assert_eq!(table.free_count(), 2);
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn unbacked_slot_rebound_after_reset() {
        let (mut table, mut arena) = make_table();
        table.acquire(8, 1, &mut arena).unwrap();
        table.acquire(8, 1, &mut arena).unwrap();
        table.bump_all_generations();
        arena.reset();
        let big = table.acquire(64, 16, &mut arena).unwrap();
        assert_eq!(big, SlotIndex(0));
        assert_eq!(table.get(big).unwrap().range(), Some(0..64));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn exhausted_generation_retires_on_release() {
        let (mut table, mut arena) = make_table();
        table.max_generation = Generation(1);
        let a = table.acquire(8, 1, &mut arena).unwrap();
        assert_eq!(table.release(a), Ok(Release::Recycled));
        assert_eq!(table.acquire(8, 1, &mut arena).unwrap(), a);
        assert_eq!(table.release(a), Ok(Release::Retired));
        assert_eq!(table.get(a).unwrap().state(), SlotState::Retired);
        assert_eq!(table.get(a).unwrap().generation(), Generation(1));
        assert_eq!(table.retired(), &[a]);
        assert_eq!(table.free_count(), 0);

        let b = table.acquire(8, 1, &mut arena).unwrap();
        assert_ne!(b, a, "retired slot must not be reused");
    }

    #[test]
    fn exhausted_generation_retires_on_bump() {
        let (mut table, mut arena) = make_table();
        table.max_generation = Generation(0);
        let a = table.acquire(8, 1, &mut arena).unwrap();
        table.bump_all_generations();
        assert_eq!(table.get(a).unwrap().state(), SlotState::Retired);
        assert_eq!(table.retired_count(), 1);
        // Retired slots stay retired across further bumps.
        table.bump_all_generations();
        assert_eq!(table.retired_count(), 1);
        assert_eq!(table.free_count(), 0);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn live_blocks_never_overlap(
                ops in proptest::collection::vec((any::<bool>(), 1usize..48, 0u32..4), 1..60),
            ) {
                let (mut table, mut arena) = make_table();
                let mut live: Vec<SlotIndex> = Vec::new();
                for (alloc, size, shift) in ops {
                    if alloc || live.is_empty() {
                        if let Ok(i) = table.acquire(size, 1 << shift, &mut arena) {
                            live.push(i);
                        }
                    } else {
                        let victim = live.swap_remove(size % live.len());
                        table.release(victim).unwrap();
                    }
                }
                let mut ranges: Vec<_> = live
                    .iter()
                    .map(|&i| table.get(i).unwrap().block().unwrap())
                    .map(|b| b.offset..b.offset + b.capacity)
                    .collect();
                ranges.sort_by_key(|r| r.start);
                for pair in ranges.windows(2) {
                    prop_assert!(pair[0].end <= pair[1].start);
                }
                prop_assert_eq!(table.live_count(), live.len());
            }

            #[test]
            fn reuse_always_raises_generation(
                sizes in proptest::collection::vec(1usize..32, 1..30),
            ) {
                let (mut table, mut arena) = make_table();
                let mut highest: std::collections::HashMap<SlotIndex, Generation> =
                    std::collections::HashMap::new();
                for size in sizes {
                    let i = table.acquire(size, 1, &mut arena).unwrap();
                    let generation = table.get(i).unwrap().generation();
                    if let Some(prev) = highest.get(&i) {
                        prop_assert!(generation > *prev);
                    }
                    highest.insert(i, generation);
                    table.release(i).unwrap();
                }
            }
        }
    }
}
