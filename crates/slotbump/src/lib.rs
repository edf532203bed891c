//! slotbump: a fixed-capacity bump arena addressed through generation-checked
//! handles.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the slotbump sub-crates. For most users, adding `slotbump` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use slotbump::prelude::*;
//!
//! let mut alloc = Allocator::new(16);
//! let a = alloc.allocate(8, 4).unwrap();
//! let b = alloc.allocate(8, 4).unwrap();
//! assert_eq!(alloc.bytes_used(), 16);
//! assert!(matches!(alloc.allocate(1, 1), Err(AllocError::OutOfMemory { .. })));
//!
//! alloc.free(a).unwrap();
//! let c = alloc.allocate(4, 4).unwrap();
//! assert!(matches!(alloc.resolve(a), Err(AllocError::UseAfterFree { .. })));
//! assert!(matches!(alloc.free(a), Err(AllocError::DoubleFree { .. })));
//! assert_eq!(alloc.range(c).unwrap(), 0..4);
//!
//! alloc.reset();
//! assert!(alloc.get(b).is_err());
//! assert_eq!(alloc.bytes_used(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `slotbump-arena` | `Allocator`, `Arena`, `SlotTable`, config and stats |
//! | [`types`] | `slotbump-core` | `Handle`, `HandleLayout`, ids, `AllocError` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Allocator, arena, and slot table (`slotbump-arena`).
pub use slotbump_arena as arena;

/// Handles, ids, and errors (`slotbump-core`).
pub use slotbump_core as types;

/// Common imports for typical slotbump usage.
///
/// ```rust
/// use slotbump::prelude::*;
/// ```
pub mod prelude {
    pub use slotbump_arena::{Allocator, AllocatorConfig, AllocatorStats};
    pub use slotbump_core::{AllocError, Generation, Handle, HandleLayout, SlotIndex};
}
