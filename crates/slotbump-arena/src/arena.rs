//! Fixed-capacity bump region.
//!
//! An [`Arena`] owns one contiguous byte buffer and a cursor that only moves
//! forward. Individual ranges are never given back; the whole region is
//! reclaimed at once by [`Arena::reset`].

use std::ops::Range;

use slotbump_core::AllocError;

use crate::raw::AlignedBuffer;

/// A single contiguous memory region with bump allocation.
///
/// The arena hands out byte offsets, not references. It performs no
/// lifetime tracking; that is the slot table's job.
pub struct Arena {
    /// Backing storage. Allocated to full capacity at creation.
    buffer: AlignedBuffer,
    /// Alignment of the buffer's base address.
    max_align: usize,
    /// Bump pointer: next free byte.
    offset: usize,
}

impl Arena {
    /// Create an arena of `capacity` bytes whose base address is aligned to
    /// `max_align`.
    ///
    /// The buffer is zero-initialised. `max_align` must be a power of two.
    pub fn new(capacity: usize, max_align: usize) -> Self {
        Self {
            buffer: AlignedBuffer::new(capacity, max_align),
            max_align,
            offset: 0,
        }
    }

    /// Reserve `size` bytes at an offset that is a multiple of `align`.
    ///
    /// The cursor is rounded up with `(offset + align - 1) & !(align - 1)`
    /// before reserving. Returns `Err(AllocError::InvalidAlignment)` if
    /// `align` is not a power of two or exceeds the base alignment, and
    /// `Err(AllocError::OutOfMemory)` if the padded request does not fit.
    /// On error the cursor is unchanged.
    pub fn reserve(&mut self, size: usize, align: usize) -> Result<usize, AllocError> {
        self.check_align(align)?;
        let out_of_memory = || AllocError::OutOfMemory {
            requested: size,
            align,
            remaining: self.remaining(),
        };
        let start = self
            .offset
            .checked_add(align - 1)
            .map(|padded| padded & !(align - 1))
            .ok_or_else(out_of_memory)?;
        let end = start.checked_add(size).ok_or_else(out_of_memory)?;
        if end > self.capacity() {
            return Err(out_of_memory());
        }
        self.offset = end;
        Ok(start)
    }

    /// Validate an alignment without reserving anything.
    pub fn check_align(&self, align: usize) -> Result<(), AllocError> {
        if !align.is_power_of_two() || align > self.max_align {
            return Err(AllocError::InvalidAlignment {
                align,
                max: self.max_align,
            });
        }
        Ok(())
    }

    /// Rewind the cursor to zero.
    ///
    /// The bytes are NOT cleared. Everything previously reserved is garbage
    /// until it is written again; callers that need zeroed memory must fill
    /// the range themselves after the next `reserve`.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Shared view of a reserved byte range.
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past the arena's capacity.
    pub fn bytes(&self, range: Range<usize>) -> &[u8] {
        &self.buffer.as_slice()[range]
    }

    /// Mutable view of a reserved byte range.
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past the arena's capacity.
    pub fn bytes_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.buffer.as_mut_slice()[range]
    }

    /// Current bump offset, i.e. bytes consumed including padding.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes left between the cursor and the end of the arena.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    /// Alignment of the buffer's base address.
    pub fn max_align(&self) -> usize {
        self.max_align
    }
}
