//! Core types for the slotbump allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! slot and generation identifiers, the packed [`Handle`] token together
//! with its [`HandleLayout`] encode/decode pair, and [`AllocError`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handle;
pub mod id;

pub use error::AllocError;
pub use handle::{Handle, HandleLayout};
pub use id::{Generation, SlotIndex};
