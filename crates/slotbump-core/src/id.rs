//! Strongly-typed slot and generation identifiers.

use std::fmt;

/// Position of a slot in the slot table.
///
/// Slots are appended in order and never removed, so `SlotIndex(n)` always
/// refers to the n-th slot ever created by an allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub u32);

impl SlotIndex {
    /// The index as a `usize`, for indexing into the table.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SlotIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Per-slot generation counter.
///
/// Starts at 0 when a slot is created and advances by one each time the
/// slot is released or the allocator is reset. A handle is valid only while
/// its generation equals the slot's current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// The first generation of every slot.
    pub const ZERO: Self = Self(0);

    /// The next generation, or `None` if it would exceed `max`.
    pub fn next(self, max: Generation) -> Option<Self> {
        if self.0 >= max.0 {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Generation {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
