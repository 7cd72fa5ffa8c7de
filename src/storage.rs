//! Storage for a pool with sizes known at compile time.

use crate::pool::{Block, ConfigError, FreeList, Pool, PoolConfig, Result};

/// Buffer, descriptors and free lists of a pool in one value.
///
/// `SLOTS` must be [`descriptor_count(BYTES, min)`](crate::pool::descriptor_count)
/// and `CLASSES` the number of size classes, `max - min + 1`. The buffer starts
/// at a 16 byte boundary.
///
/// ```
/// use mempool::{pool::descriptor_count, storage::PoolStorage};
///
/// let mut storage = PoolStorage::<4096, { descriptor_count(4096, 4) }, 7>::new();
/// let mut pool = storage.pool(4, 10).unwrap();
///
/// let ptr = pool.allocate(1000).unwrap();
/// assert_eq!(ptr.as_ptr() as usize % 16, 0);
/// assert_eq!(pool.free_bytes(), 4096 - 1024);
/// ```
#[repr(C, align(16))]
pub struct PoolStorage<const BYTES: usize, const SLOTS: usize, const CLASSES: usize> {
    buffer: [u8; BYTES],
    blocks: [Block; SLOTS],
    lists: [FreeList; CLASSES],
}

impl<const BYTES: usize, const SLOTS: usize, const CLASSES: usize>
    PoolStorage<BYTES, SLOTS, CLASSES>
{
    /// Create zeroed storage. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            buffer: [0; BYTES],
            blocks: [Block::EMPTY; SLOTS],
            lists: [FreeList::EMPTY; CLASSES],
        }
    }

    /// Create a pool over this storage with block sizes from `2^min_class_exponent`
    /// to `2^max_class_exponent` bytes.
    pub fn pool(&mut self, min_class_exponent: u8, max_class_exponent: u8) -> Result<Pool<'_>> {
        let total = u32::try_from(BYTES).map_err(|_| ConfigError::BufferTooLarge)?;
        let config = PoolConfig::new(total, min_class_exponent, max_class_exponent);
        Pool::new(config, &mut self.buffer, &mut self.blocks, &mut self.lists)
    }
}

impl<const BYTES: usize, const SLOTS: usize, const CLASSES: usize> Default
    for PoolStorage<BYTES, SLOTS, CLASSES>
{
    fn default() -> Self {
        Self::new()
    }
}
