//! Intrusive, index based free list.
//!
//! The links live inside the [`Block`] descriptors, so a list itself is only
//! a pair of slot indices and a counter. Every operation takes the descriptor
//! array the list was built on.

use super::Block;
use core::iter::FusedIterator;

/// Doubly linked list of descriptor slots, used for one size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeList {
    first: Option<usize>,
    last: Option<usize>,
    len: usize,
}

impl FreeList {
    /// An empty list.
    pub const EMPTY: FreeList = FreeList::new();

    /// Create a new, empty `FreeList`.
    pub const fn new() -> Self {
        Self {
            first: None,
            last: None,
            len: 0,
        }
    }

    /// Returns whether this list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of slots inside this list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// The slot that was pushed most recently.
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// Append `slot` to the list, making it the most recent member.
    ///
    /// `slot` must not be a member of any list.
    pub fn push(&mut self, blocks: &mut [Block], slot: usize) {
        debug_assert!(
            blocks[slot].prev.is_none() && blocks[slot].next.is_none() && self.first != Some(slot),
            "slot {} is already linked",
            slot
        );

        blocks[slot].prev = self.last;
        blocks[slot].next = None;

        match self.last {
            Some(last) => blocks[last].next = Some(slot),
            None => self.first = Some(slot),
        }

        self.last = Some(slot);
        self.len += 1;
    }

    /// Unlink `slot`, which must be a member of this list.
    pub fn remove(&mut self, blocks: &mut [Block], slot: usize) {
        debug_assert!(self.len > 0, "remove from an empty list");

        let prev = blocks[slot].prev.take();
        let next = blocks[slot].next.take();

        match prev {
            Some(prev) => blocks[prev].next = next,
            None => self.first = next,
        }

        match next {
            Some(next) => blocks[next].prev = prev,
            None => self.last = prev,
        }

        self.len -= 1;
    }

    /// Removes the most recent slot from this list.
    pub fn pop(&mut self, blocks: &mut [Block]) -> Option<usize> {
        let slot = self.last?;
        self.remove(blocks, slot);
        Some(slot)
    }

    /// Returns an iterator over the slots in this list, oldest first.
    pub fn iter<'list>(&self, blocks: &'list [Block]) -> Iter<'list> {
        Iter {
            blocks,
            head: self.first,
            remaining: self.len,
        }
    }

    /// Returns whether `slot` is linked into this list.
    pub fn contains(&self, blocks: &[Block], slot: usize) -> bool {
        self.iter(blocks).any(|member| member == slot)
    }
}

impl Default for FreeList {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the members of a [`FreeList`].
pub struct Iter<'list> {
    blocks: &'list [Block],
    head: Option<usize>,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.head?;
        self.head = self.blocks[slot].next;
        self.remaining -= 1;
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &FreeList, blocks: &[Block]) -> Vec<usize> {
        list.iter(blocks).collect()
    }

    #[test]
    fn push_and_pop_most_recent() {
        let mut blocks = [Block::EMPTY; 8];
        let mut list = FreeList::new();

        list.push(&mut blocks, 3);
        list.push(&mut blocks, 5);
        list.push(&mut blocks, 1);
        assert_eq!(list.len(), 3);
        assert_eq!(list.last(), Some(1));
        assert_eq!(collect(&list, &blocks), [3, 5, 1]);

        assert_eq!(list.pop(&mut blocks), Some(1));
        assert_eq!(list.pop(&mut blocks), Some(5));
        assert_eq!(list.pop(&mut blocks), Some(3));
        assert_eq!(list.pop(&mut blocks), None);
        assert!(list.is_empty());
        assert!(blocks.iter().all(|b| b.prev.is_none() && b.next.is_none()));
    }

    #[test]
    fn remove_from_any_position() {
        let mut blocks = [Block::EMPTY; 8];
        let mut list = FreeList::new();
        for slot in [0, 2, 4, 6] {
            list.push(&mut blocks, slot);
        }

        // middle
        list.remove(&mut blocks, 2);
        assert_eq!(collect(&list, &blocks), [0, 4, 6]);

        // first
        list.remove(&mut blocks, 0);
        assert_eq!(collect(&list, &blocks), [4, 6]);

        // last
        list.remove(&mut blocks, 6);
        assert_eq!(collect(&list, &blocks), [4]);
        assert_eq!(list.last(), Some(4));

        list.remove(&mut blocks, 4);
        assert!(list.is_empty());
        assert_eq!(list.last(), None);
        assert_eq!(list.iter(&blocks).len(), 0);
    }

    #[test]
    fn removed_slot_can_be_pushed_again() {
        let mut blocks = [Block::EMPTY; 4];
        let mut list = FreeList::new();
        list.push(&mut blocks, 0);
        list.push(&mut blocks, 1);

        list.remove(&mut blocks, 0);
        list.push(&mut blocks, 0);

        assert_eq!(collect(&list, &blocks), [1, 0]);
        assert!(list.contains(&blocks, 1));
        assert!(!list.contains(&blocks, 2));
    }

    #[test]
    fn lists_share_one_descriptor_array() {
        let mut blocks = [Block::EMPTY; 6];
        let mut even = FreeList::new();
        let mut odd = FreeList::new();

        for slot in 0..6 {
            if slot % 2 == 0 {
                even.push(&mut blocks, slot);
            } else {
                odd.push(&mut blocks, slot);
            }
        }

        odd.remove(&mut blocks, 3);
        assert_eq!(collect(&even, &blocks), [0, 2, 4]);
        assert_eq!(collect(&odd, &blocks), [1, 5]);
    }
}
