//! Allocator error types.
//!
//! Errors fall into four groups: resource exhaustion (`OutOfMemory`,
//! `CapacityExceeded`), contract violations (`InvalidAlignment`,
//! `InvalidConfig`), lifetime violations (`InvalidHandle`, `UseAfterFree`,
//! `DoubleFree`) and counter exhaustion (`GenerationOverflow`). None of them
//! is fatal: the allocator stays usable and unchanged after returning one.

use std::error::Error;
use std::fmt;

use crate::handle::Handle;
use crate::id::{Generation, SlotIndex};

/// Errors returned by allocator operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The arena has no room for the request after alignment padding.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
        /// Alignment requested.
        align: usize,
        /// Bytes left between the bump offset and the end of the arena.
        remaining: usize,
    },
    /// Alignment is not a power of two, or exceeds the arena's base alignment.
    InvalidAlignment {
        /// The rejected alignment.
        align: usize,
        /// Largest alignment the arena supports.
        max: usize,
    },
    /// The handle's index lies outside the slot table.
    InvalidHandle {
        /// The rejected handle.
        handle: Handle,
    },
    /// The handle refers to a slot whose allocation has been freed or reset.
    UseAfterFree {
        /// Slot the handle points at.
        index: SlotIndex,
        /// Generation encoded in the handle.
        handle_generation: Generation,
        /// Current generation of the slot.
        slot_generation: Generation,
    },
    /// The handle was already freed.
    DoubleFree {
        /// Slot the handle points at.
        index: SlotIndex,
        /// Generation encoded in the handle.
        generation: Generation,
    },
    /// The slot table cannot grow past the handle's index field.
    CapacityExceeded {
        /// Number of slots that would be needed.
        requested: u64,
        /// Number of slots the index field can address.
        limit: u64,
    },
    /// A generation does not fit the handle's generation field.
    GenerationOverflow {
        /// Slot whose counter is exhausted.
        index: SlotIndex,
        /// The generation that could not be represented.
        generation: Generation,
    },
    /// Allocator configuration failed validation.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl AllocError {
    /// Whether this error reports a stale, forged, or repeated handle.
    pub fn is_lifetime_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidHandle { .. } | Self::UseAfterFree { .. } | Self::DoubleFree { .. }
        )
    }

    /// Whether this error reports exhausted space or slots.
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::OutOfMemory { .. } | Self::CapacityExceeded { .. }
        )
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                align,
                remaining,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes (align {align}), {remaining} bytes remaining"
                )
            }
            Self::InvalidAlignment { align, max } => {
                write!(
                    f,
                    "invalid alignment {align}: must be a power of two no greater than {max}"
                )
            }
            Self::InvalidHandle { handle } => write!(f, "invalid handle: {handle}"),
            Self::UseAfterFree {
                index,
                handle_generation,
                slot_generation,
            } => {
                write!(
                    f,
                    "use after free: slot {index} handle generation {handle_generation}, slot generation {slot_generation}"
                )
            }
            Self::DoubleFree { index, generation } => {
                write!(f, "double free: slot {index} generation {generation}")
            }
            Self::CapacityExceeded { requested, limit } => {
                write!(
                    f,
                    "slot capacity exceeded: {requested} slots needed, handle index field holds {limit}"
                )
            }
            Self::GenerationOverflow { index, generation } => {
                write!(
                    f,
                    "generation overflow: slot {index} generation {generation} does not fit the handle"
                )
            }
            Self::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for AllocError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_slot() {
        let err = AllocError::UseAfterFree {
            index: SlotIndex(3),
            handle_generation: Generation(1),
            slot_generation: Generation(2),
        };
        assert_eq!(
            err.to_string(),
            "use after free: slot 3 handle generation 1, slot generation 2"
        );
    }

    #[test]
    fn classification() {
        let oom = AllocError::OutOfMemory {
            requested: 1,
            align: 1,
            remaining: 0,
        };
        assert!(oom.is_exhaustion());
        assert!(!oom.is_lifetime_violation());

        let df = AllocError::DoubleFree {
            index: SlotIndex(0),
            generation: Generation(0),
        };
        assert!(df.is_lifetime_violation());
        assert!(!df.is_exhaustion());
    }
}
