//! Static pool configuration and its validation.

use super::{ConfigError, MAX_ABSOLUTE_EXPONENT, MIN_ABSOLUTE_EXPONENT};
use core::cmp;

/// Returns how many [`Block`](super::Block) descriptors a pool of `total_bytes`
/// with a minimum block size of `2^min_class_exponent` needs.
///
/// Every descriptor covers two minimum sized blocks.
pub const fn descriptor_count(total_bytes: u32, min_class_exponent: u8) -> usize {
    ((total_bytes >> min_class_exponent) / 2) as usize
}

/// The parameters of a pool.
///
/// Block sizes range from `2^min_class_exponent` to `2^max_class_exponent` bytes.
/// `class_span` is the distance between both exponents and is stored separately
/// so it can be checked against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// The number of bytes the pool manages.
    pub total_bytes: u32,
    /// Exponent of the smallest block size.
    pub min_class_exponent: u8,
    /// Exponent of the largest block size.
    pub max_class_exponent: u8,
    /// `max_class_exponent - min_class_exponent`
    pub class_span: u8,
}

impl PoolConfig {
    /// Create a configuration and derive the class span from both exponents.
    pub const fn new(total_bytes: u32, min_class_exponent: u8, max_class_exponent: u8) -> Self {
        Self {
            total_bytes,
            min_class_exponent,
            max_class_exponent,
            class_span: max_class_exponent.wrapping_sub(min_class_exponent),
        }
    }

    /// Check that the exponents are inside the supported bounds and consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_class_exponent < MIN_ABSOLUTE_EXPONENT {
            return Err(ConfigError::MinExponentTooSmall(self.min_class_exponent));
        }

        if self.max_class_exponent < self.min_class_exponent {
            return Err(ConfigError::MaxExponentBelowMin);
        }

        if self.max_class_exponent > MAX_ABSOLUTE_EXPONENT {
            return Err(ConfigError::MaxExponentTooLarge(self.max_class_exponent));
        }

        if self.class_span != self.max_class_exponent - self.min_class_exponent {
            return Err(ConfigError::ClassSpanMismatch(self.class_span));
        }

        // class 0 packs two blocks into one slot, which can't express
        // "both halves free", so there must be a class above it.
        if self.class_span == 0 {
            return Err(ConfigError::EmptyClassSpan);
        }

        if self.max_blocks() == 0 {
            return Err(ConfigError::NoMaxBlock);
        }

        Ok(())
    }

    /// The number of size classes, and thus of free lists.
    pub fn class_count(&self) -> usize {
        self.class_span as usize + 1
    }

    /// The number of descriptors a pool with this configuration needs.
    pub fn descriptor_count(&self) -> usize {
        descriptor_count(self.total_bytes, self.min_class_exponent)
    }

    /// The size in bytes of a block in the given class.
    pub fn block_size(&self, class: u8) -> u32 {
        1 << (self.min_class_exponent + class)
    }

    /// The smallest block size.
    pub fn min_block_size(&self) -> u32 {
        self.block_size(0)
    }

    /// The largest block size.
    pub fn max_block_size(&self) -> u32 {
        self.block_size(self.class_span)
    }

    /// The number of maximum sized blocks that fit into the pool.
    pub fn max_blocks(&self) -> u32 {
        self.total_bytes >> self.max_class_exponent
    }

    /// The number of bytes that are covered by maximum sized blocks.
    ///
    /// Anything past this is never handed out.
    pub fn managed_bytes(&self) -> u32 {
        self.max_blocks() << self.max_class_exponent
    }

    /// Calculates the smallest class whose blocks can hold `size` bytes.
    ///
    /// Returns `None` for a size of zero or a size larger than the maximum block.
    pub fn class_for_size(&self, size: u32) -> Option<u8> {
        if size == 0 {
            return None;
        }

        let size = cmp::max(size, self.min_block_size()).checked_next_power_of_two()?;
        let exponent = size.trailing_zeros() as u8;

        if exponent > self.max_class_exponent {
            None
        } else {
            Some(exponent - self.min_class_exponent)
        }
    }
}
