//! Packed allocation handles and their bit layout.
//!
//! A [`Handle`] is a single `u64` holding a slot index in the low bits and
//! the slot generation observed at allocation time in the high bits:
//!
//! ```text
//!  63                     index_bits              0
//! ┌──────────────────────┬────────────────────────┐
//! │      generation      │         index          │
//! └──────────────────────┴────────────────────────┘
//! ```
//!
//! The split is fixed per allocator by a [`HandleLayout`]. Packing and
//! unpacking go through [`HandleLayout::encode`] and [`HandleLayout::decode`]
//! only; no other code shifts or masks handle bits.

use std::fmt;

use crate::error::AllocError;
use crate::id::{Generation, SlotIndex};

/// Opaque reference to an allocation.
///
/// A handle carries no ownership. It is a capability token that stays
/// valid only while its generation matches the slot's current generation.
/// Handles are `Copy`; copying one does not extend the allocation's life.
///
/// A handle does not record which allocator issued it. Resolving it against
/// a different allocator is not detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct Handle(u64);

impl Handle {
    /// The raw packed token.
    pub fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from a raw token.
    ///
    /// Any `u64` is accepted. Tokens that were never issued are rejected by
    /// the allocator at resolve time, not here.
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#018x})", self.0)
    }
}

/// Bit split between the index and generation fields of a [`Handle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandleLayout {
    index_bits: u32,
}

impl HandleLayout {
    /// Default index width: 32 bits of index, 32 bits of generation.
    pub const DEFAULT_INDEX_BITS: u32 = 32;

    /// Widest supported index field, leaving one bit of generation.
    ///
    /// Indices are stored as `u32`, so widths above 32 add no slots; they
    /// only shrink the generation field.
    pub const MAX_INDEX_BITS: u32 = 63;

    /// Create a layout with `index_bits` bits of index.
    ///
    /// The generation field gets the remaining `64 - index_bits` bits.
    /// Returns `Err(AllocError::InvalidConfig)` unless
    /// `1 <= index_bits <= 63`.
    pub fn new(index_bits: u32) -> Result<Self, AllocError> {
        if index_bits == 0 || index_bits > Self::MAX_INDEX_BITS {
            return Err(AllocError::InvalidConfig {
                reason: format!(
                    "index_bits must be in 1..={} (got {index_bits})",
                    Self::MAX_INDEX_BITS
                ),
            });
        }
        Ok(Self { index_bits })
    }

    /// Width of the index field in bits.
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Width of the generation field in bits.
    pub fn generation_bits(&self) -> u32 {
        u64::BITS - self.index_bits
    }

    /// Number of distinct slot indices this layout can address.
    pub fn max_slots(&self) -> u64 {
        1u64 << self.index_bits.min(u32::BITS)
    }

    /// Largest generation this layout can represent.
    pub fn max_generation(&self) -> Generation {
        Generation(u64::MAX >> self.index_bits)
    }

    fn index_mask(&self) -> u64 {
        (1u64 << self.index_bits) - 1
    }

    /// Pack `index` and `generation` into a handle.
    ///
    /// Returns `Err(AllocError::CapacityExceeded)` if the index does not fit
    /// the index field and `Err(AllocError::GenerationOverflow)` if the
    /// generation does not fit the generation field.
    pub fn encode(&self, index: SlotIndex, generation: Generation) -> Result<Handle, AllocError> {
        let raw_index = u64::from(index.0);
        if raw_index > self.index_mask() {
            return Err(AllocError::CapacityExceeded {
                requested: raw_index + 1,
                limit: self.max_slots(),
            });
        }
        if generation > self.max_generation() {
            return Err(AllocError::GenerationOverflow { index, generation });
        }
        Ok(Handle((generation.0 << self.index_bits) | raw_index))
    }

    /// Split a handle into its index and generation.
    ///
    /// Exact inverse of [`HandleLayout::encode`]. A token that `encode` never
    /// produced may decode to a truncated index when `index_bits > 32`; use
    /// [`HandleLayout::is_canonical`] to reject such tokens.
    pub fn decode(&self, handle: Handle) -> (SlotIndex, Generation) {
        let index = (handle.0 & self.index_mask()) as u32;
        let generation = handle.0 >> self.index_bits;
        (SlotIndex(index), Generation(generation))
    }

    /// Whether `handle` is exactly what `encode` yields for its decoded fields.
    pub fn is_canonical(&self, handle: Handle) -> bool {
        let (index, generation) = self.decode(handle);
        self.encode(index, generation) == Ok(handle)
    }
}

impl Default for HandleLayout {
    fn default() -> Self {
        Self {
            index_bits: Self::DEFAULT_INDEX_BITS,
        }
    }
}
