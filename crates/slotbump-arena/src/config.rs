//! Allocator configuration parameters.

use slotbump_core::{AllocError, HandleLayout};

/// Configuration for an [`Allocator`](crate::Allocator).
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug)]
pub struct AllocatorConfig {
    /// Size of the arena in bytes. The whole region is allocated up front.
    pub capacity: usize,

    /// Alignment of the arena's base address in bytes.
    ///
    /// Default: 4096. Must be a power of two. Requests with a larger
    /// alignment are rejected with `InvalidAlignment`, since an aligned
    /// offset would no longer imply an aligned address.
    pub max_align: usize,

    /// Width of the handle's index field in bits (1..=63).
    ///
    /// Default: 32. The generation field gets the remaining bits, so a
    /// narrower index buys more generations per slot before retirement.
    /// The slot table never exceeds `2^min(index_bits, 32)` slots.
    pub index_bits: u32,

    /// Zero-fill every block when it is handed out by `allocate`.
    ///
    /// Default: `true`. When `false`, a fresh allocation exposes whatever
    /// bytes were left in the arena by earlier generations.
    pub zero_on_allocate: bool,
}

impl AllocatorConfig {
    /// Default base alignment: one 4 KiB page.
    pub const DEFAULT_MAX_ALIGN: usize = 4096;

    /// Default handle index width.
    pub const DEFAULT_INDEX_BITS: u32 = HandleLayout::DEFAULT_INDEX_BITS;

    /// Create a config for an arena of `capacity` bytes.
    ///
    /// Uses default values for all other parameters.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            max_align: Self::DEFAULT_MAX_ALIGN,
            index_bits: Self::DEFAULT_INDEX_BITS,
            zero_on_allocate: true,
        }
    }

    /// Check every field, returning the handle layout it describes.
    pub fn validate(&self) -> Result<HandleLayout, AllocError> {
        if !self.max_align.is_power_of_two() {
            return Err(AllocError::InvalidConfig {
                reason: format!(
                    "max_align must be a power of two (got {})",
                    self.max_align
                ),
            });
        }
        if self.capacity.checked_add(self.max_align - 1).is_none() {
            return Err(AllocError::InvalidConfig {
                reason: format!(
                    "capacity {} plus alignment padding overflows usize",
                    self.capacity
                ),
            });
        }
        HandleLayout::new(self.index_bits)
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AllocatorConfig::new(1024);
        let layout = config.validate().unwrap();
        assert_eq!(layout, HandleLayout::default());
        assert!(config.zero_on_allocate);
    }

    #[test]
    fn non_power_of_two_max_align_rejected() {
        let mut config = AllocatorConfig::new(64);
        config.max_align = 24;
        assert!(matches!(
            config.validate(),
            Err(AllocError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_max_align_rejected() {
        let mut config = AllocatorConfig::new(64);
        config.max_align = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn padding_overflow_rejected() {
        let config = AllocatorConfig::new(usize::MAX);
        assert!(matches!(
            config.validate(),
            Err(AllocError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn index_bits_checked() {
        let mut config = AllocatorConfig::new(64);
        config.index_bits = 64;
        assert!(config.validate().is_err());
        config.index_bits = 40;
        assert_eq!(config.validate().unwrap().generation_bits(), 24);
        config.index_bits = 8;
        assert_eq!(config.validate().unwrap().max_slots(), 256);
    }
}
