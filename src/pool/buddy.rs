//! Implementation of the buddy allocation algorithm on top of a fixed byte buffer.
//!
//! Every block has a size of `2^(min_class_exponent + class)` bytes. A block of
//! class `c` is split into two buddies of class `c - 1` on allocation, and merged
//! back with its buddy when both are free again.
//!
//! The bookkeeping is done with descriptor *slots*. A slot index multiplied by two
//! gives the *physical* index of the block, which is the offset of the block in
//! units of the minimum block size:
//!
//! ```text
//! physical:  0   1   2   3   4   5   6   7
//!          +---+---+---+---+---+---+---+---+
//!          |   slot 0  |   slot 2  | 3 | 3 |   slot 0: class 2
//!          |           |  class 1  |   |   |   slot 2: class 1
//!          +---+---+---+---+---+---+---+---+   slot 3: class 0, two halves
//! ```
//!
//! Two blocks of class `0` share a single slot, and the low bit of the physical
//! index tells them apart.

use super::{
    AllocStats, Block, BlockStatus, ConfigError, Error, FreeList, PoolConfig, Result,
};
use core::{cmp, marker::PhantomData, ptr::NonNull};
use log::{debug, info, trace};

/// A memory pool that serves power-of-two sized blocks from a caller provided buffer.
///
/// The pool is strictly single threaded. It can be moved to another thread, but every
/// access has to go through `&mut self`. Use [`LockedPool`](crate::sync::LockedPool)
/// to share it.
pub struct Pool<'a> {
    base: NonNull<u8>,
    config: PoolConfig,
    blocks: &'a mut [Block],
    lists: &'a mut [FreeList],
    stats: AllocStats,
    _buffer: PhantomData<&'a mut [u8]>,
}

// SAFETY
// The pool has exclusive access to the buffer for `'a`, exactly like the
// `&'a mut [u8]` it was created from, which is `Send`.
unsafe impl Send for Pool<'_> {}

impl<'a> Pool<'a> {
    /// Create a new pool over `buffer` and make all of it available for allocation.
    ///
    /// `blocks` must hold exactly [`PoolConfig::descriptor_count`] descriptors and
    /// `lists` one list per size class. Their previous content is irrelevant, all of
    /// it is overwritten. Nothing is touched if the configuration is rejected.
    pub fn new(
        config: PoolConfig,
        buffer: &'a mut [u8],
        blocks: &'a mut [Block],
        lists: &'a mut [FreeList],
    ) -> Result<Self> {
        if buffer.is_empty() || blocks.is_empty() || lists.is_empty() {
            return Err(ConfigError::MissingStorage.into());
        }

        config.validate()?;

        if buffer.len() < config.total_bytes as usize {
            return Err(ConfigError::BufferTooSmall(buffer.len()).into());
        }

        if lists.len() != config.class_count() {
            return Err(ConfigError::FreeListCount(lists.len()).into());
        }

        if blocks.len() != config.descriptor_count() {
            return Err(ConfigError::DescriptorCount(blocks.len()).into());
        }

        lists.fill(FreeList::EMPTY);
        blocks.fill(Block::EMPTY);

        // every maximum sized block spans `2^k / 2` slots, and all of them are
        // marked as part of that free block. only the first one is linked.
        let top = config.class_span;
        let stride = 1usize << (top - 1);
        for max_block in 0..config.max_blocks() as usize {
            let slot = max_block * stride;
            blocks[slot..slot + stride]
                .iter_mut()
                .for_each(|block| block.set(top, BlockStatus::Free));
            lists[top as usize].push(blocks, slot);
        }

        let mut stats = AllocStats::with_name("Buddy Pool");
        stats.total = config.managed_bytes() as usize;

        info!(
            "Initialized pool with {} blocks of {} bytes ({}..={} byte classes)",
            config.max_blocks(),
            config.max_block_size(),
            config.min_block_size(),
            config.max_block_size(),
        );

        Ok(Self {
            base: NonNull::from(buffer).cast(),
            config,
            blocks,
            lists,
            stats,
            _buffer: PhantomData,
        })
    }

    /// Allocates a block that can hold at least `size` bytes.
    ///
    /// The returned pointer stays valid until it is passed to [`free`](Self::free).
    /// Blocks are aligned to their size relative to the start of the buffer.
    pub fn allocate(&mut self, size: u32) -> Result<NonNull<u8>> {
        let class = match self.config.class_for_size(size) {
            Some(class) => class,
            None => {
                debug!("Rejected allocation of {} bytes", size);
                self.stats.failed += 1;
                return Err(Error::InvalidSize(size));
            }
        };

        let (slot, buddy1) = match self.take_block(class) {
            Some(found) => found,
            None => {
                debug!(
                    "No free block for {} bytes ({} bytes free)",
                    size,
                    self.free_bytes()
                );
                self.stats.failed += 1;
                return Err(Error::OutOfMemory);
            }
        };

        self.stats.allocations += 1;
        self.stats.allocated += self.config.block_size(class) as usize;

        let physical = (slot << 1) | buddy1 as usize;
        Ok(self.address_of(physical))
    }

    /// Returns the block at `ptr` to the pool and merges it with its free buddies.
    ///
    /// Pointers that do not start a live allocation of this pool are rejected with
    /// [`Error::InvalidPointer`] and leave the pool untouched. This catches pointers
    /// outside the buffer, double frees and pointers into the middle of a block.
    pub fn free(&mut self, ptr: NonNull<u8>) -> Result<()> {
        let physical = match self.physical_index(ptr) {
            Some(idx) => idx,
            None => {
                debug!("Rejected free of {:p}: not inside the pool", ptr);
                return Err(Error::InvalidPointer);
            }
        };

        let slot = physical >> 1;
        let buddy1 = physical & 1 == 1;

        if !self.blocks[slot].is_live(buddy1) {
            debug!("Rejected free of {:p}: block is not allocated", ptr);
            return Err(Error::InvalidPointer);
        }

        let class = self.blocks[slot].class();
        let (merged_slot, merged_class) = self.coalesce(slot, class);

        // a class 0 slot that could not be merged has only one free half
        let status = match (merged_class, buddy1) {
            (0, true) => BlockStatus::Buddy1Free,
            (0, false) => BlockStatus::Buddy0Free,
            _ => BlockStatus::Free,
        };
        self.blocks[merged_slot].set_status(status);
        self.lists[merged_class as usize].push(self.blocks, merged_slot);

        self.stats.frees += 1;
        self.stats.allocated = self
            .stats
            .allocated
            .saturating_sub(self.config.block_size(class) as usize);

        Ok(())
    }

    /// Returns the number of bytes inside free blocks.
    pub fn free_bytes(&self) -> u32 {
        self.lists
            .iter()
            .enumerate()
            .map(|(class, list)| self.config.block_size(class as u8) * list.len() as u32)
            .sum()
    }

    /// Return a copy of the statistics for this pool.
    pub fn stats(&self) -> AllocStats {
        let mut stats = self.stats.clone();
        stats.free = self.free_bytes() as usize;
        stats
    }

    /// The configuration this pool was created with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// The size of the smallest block this pool hands out.
    pub fn min_block_size(&self) -> u32 {
        self.config.min_block_size()
    }

    /// The size of the largest block this pool hands out.
    pub fn max_block_size(&self) -> u32 {
        self.config.max_block_size()
    }

    /// The number of bytes that can be handed out in total.
    pub fn managed_bytes(&self) -> u32 {
        self.config.managed_bytes()
    }

    /// Returns whether `ptr` points into the memory managed by this pool.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.offset_of(ptr)
            .map_or(false, |offset| offset < self.config.managed_bytes() as usize)
    }

    /// Returns the free list of every size class.
    pub fn free_lists(&self) -> &[FreeList] {
        self.lists
    }

    /// Returns the descriptor array.
    pub fn blocks(&self) -> &[Block] {
        self.blocks
    }

    /// Takes a free block of the given class, splitting a larger one if needed.
    ///
    /// Returns the slot and whether the odd half of a class `0` slot was taken.
    fn take_block(&mut self, class: u8) -> Option<(usize, bool)> {
        let found = (class..=self.config.class_span)
            .find(|&candidate| !self.lists[candidate as usize].is_empty())?;

        let slot = self.lists[found as usize].pop(self.blocks)?;

        // a class 0 slot holds two blocks, remember which of them was free
        let buddy1 = self.blocks[slot].status() == BlockStatus::Buddy1Free;
        self.blocks[slot].set_status(BlockStatus::Reserved);

        // walk down from the class we found to the requested one, and
        // give the upper half of every split back to the free lists.
        for target in (class..found).rev() {
            let buddy = self.divide(slot);

            // splitting a class 1 block leaves both halves in the same slot.
            // the lower one is ours, the upper one is free.
            if target == 0 {
                self.blocks[buddy].set_status(BlockStatus::Buddy1Free);
            }

            self.lists[target as usize].push(self.blocks, buddy);
            self.stats.splits += 1;
            trace!("Split slot {} into class {}, buddy {}", slot, target, buddy);
        }

        Some((slot, buddy1))
    }

    /// Merges the block at `slot` with its free buddies as long as possible.
    ///
    /// Returns the slot of the resulting block and its class.
    fn coalesce(&mut self, mut slot: usize, mut class: u8) -> (usize, u8) {
        while class < self.config.class_span {
            let buddy = self.buddy_of(slot);
            let other = &self.blocks[buddy];

            if other.class() != class || other.status() == BlockStatus::Reserved {
                break;
            }

            self.lists[class as usize].remove(self.blocks, buddy);
            slot = self.combine(slot, buddy);
            class += 1;

            self.stats.merges += 1;
            trace!("Merged slot {} with buddy {} into class {}", slot, buddy, class);
        }

        (slot, class)
    }

    /// Returns the slot of the buddy of `slot`.
    ///
    /// At class `0` both buddies live in the same slot. Above, the buddies of a
    /// class `c` block differ only in bit `c - 1` of their slot index.
    fn buddy_of(&self, slot: usize) -> usize {
        match self.blocks[slot].class() {
            0 => slot,
            class => slot ^ (1 << (class - 1)),
        }
    }

    /// Combines two buddies into one free block of the next class.
    ///
    /// Returns the lower slot, which represents the merged block.
    fn combine(&mut self, a: usize, b: usize) -> usize {
        let (low, high) = (cmp::min(a, b), cmp::max(a, b));
        let class = self.blocks[low].class() + 1;

        self.blocks[low].set(class, BlockStatus::Free);
        self.blocks[high].set(class, BlockStatus::Free);
        low
    }

    /// Splits the block at `slot` in two and marks the upper buddy as free.
    ///
    /// Returns the slot of the buddy.
    fn divide(&mut self, slot: usize) -> usize {
        let class = self.blocks[slot].class() - 1;
        let status = self.blocks[slot].status();
        self.blocks[slot].set(class, status);

        let buddy = self.buddy_of(slot);
        self.blocks[buddy].set(class, BlockStatus::Free);
        buddy
    }

    /// Computes the address of the minimum sized block with the given physical index.
    fn address_of(&self, physical: usize) -> NonNull<u8> {
        let offset = physical << self.config.min_class_exponent;
        debug_assert!(offset < self.config.total_bytes as usize);

        // SAFETY
        // Physical indices are derived from slots of the descriptor array,
        // which only covers the buffer, so the offset stays in bounds.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }
    }

    /// Translates a pointer back into the physical index of a block.
    ///
    /// Returns `None` if the pointer is outside the managed memory or does not
    /// point to the start of a minimum sized block.
    fn physical_index(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = self.offset_of(ptr)?;
        let misaligned = offset & (self.config.min_block_size() as usize - 1) != 0;

        if offset >= self.config.managed_bytes() as usize || misaligned {
            return None;
        }

        Some(offset >> self.config.min_class_exponent)
    }

    fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        (ptr.as_ptr() as usize).checked_sub(self.base.as_ptr() as usize)
    }
}
