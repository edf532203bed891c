//! Generation-checked bump arena allocator.
//!
//! A fixed-capacity byte region is carved up by a bump cursor. Every block
//! is reached only through a [`Handle`] that packs a slot index with the
//! slot's generation; freeing a block or resetting the arena advances the
//! generation, so stale handles are rejected instead of aliasing new data.
//!
//! # Architecture
//!
//! ```text
//! Allocator (façade)
//! ├── Arena       one aligned Vec-backed buffer + bump offset
//! ├── SlotTable   Slot[] (generation, state, block) + ascending free list
//! └── HandleLayout  index/generation bit split for Handle encode/decode
//! ```
//!
//! # Example
//!
//! ```
//! use slotbump_arena::Allocator;
//! use slotbump_core::AllocError;
//!
//! let mut alloc = Allocator::new(16);
//! let a = alloc.allocate(8, 4).unwrap();
//! alloc.resolve(a).unwrap().copy_from_slice(b"8 bytes!");
//! alloc.free(a).unwrap();
//! assert!(matches!(alloc.resolve(a), Err(AllocError::UseAfterFree { .. })));
//! ```
//!
//! # Concurrency
//!
//! No internal locking. Every mutating operation takes `&mut self`; share an
//! allocator behind a mutex or keep one per thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod arena;
pub mod config;
mod raw;
pub mod slot;

// Public re-exports for the primary API surface.
pub use allocator::{Allocator, AllocatorStats};
pub use arena::Arena;
pub use config::AllocatorConfig;
pub use slot::{Block, Release, Slot, SlotState, SlotTable};
pub use slotbump_core::{AllocError, Generation, Handle, HandleLayout, SlotIndex};
