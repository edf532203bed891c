//! Fixed-size byte storage with an aligned base address.
//!
//! The storage is a boxed slice over-allocated by `align - 1` bytes. The
//! usable window starts at the first address inside it that is a multiple
//! of `align`, found with the same mask the arena uses for offsets. The box
//! is never resized, so the window's address is stable for the buffer's
//! lifetime even when the owning struct moves.

pub(crate) struct AlignedBuffer {
    storage: Box<[u8]>,
    /// Padding bytes before the aligned window.
    base: usize,
    len: usize,
}

impl AlignedBuffer {
    /// Allocate a zeroed buffer of `len` bytes whose first byte is aligned
    /// to `align`.
    ///
    /// `align` must be a power of two and `len + align - 1` must not
    /// overflow; `AllocatorConfig::validate` checks both.
    pub(crate) fn new(len: usize, align: usize) -> Self {
        debug_assert!(align.is_power_of_two());
        let storage = vec![0u8; len + (align - 1)].into_boxed_slice();
        let addr = storage.as_ptr() as usize;
        let base = addr.wrapping_neg() & (align - 1);
        Self { storage, base, len }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.storage[self.base..self.base + self.len]
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.base..self.base + self.len]
    }
}
