//! Block descriptors.
//!
//! Every descriptor slot describes a block of `2^class` minimum sized blocks.
//! The exception is class `0`: there a single slot stands for *two* minimum
//! sized blocks (buddy0 and buddy1), which halves the memory needed for the
//! descriptor array.
//!
//! ```text
//!  slot:      0               1
//!         +-------+-------+-------+-------+
//!         |  b0   |  b1   |  b0   |  b1   |   class 0, physical index 0..4
//!         +-------+-------+-------+-------+
//! ```

/// The allocation state of a block descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// The block is handed out. At class `0` both halves are unavailable.
    Reserved,
    /// The whole block is free. At class `0` this only exists while splitting.
    Free,
    /// Class `0` only: buddy0 is free, buddy1 is handed out.
    Buddy0Free,
    /// Class `0` only: buddy1 is free, buddy0 is handed out.
    Buddy1Free,
}

/// A single entry in the descriptor array of a [`Pool`](super::Pool).
///
/// The caller only provides storage for these, their content is managed
/// by the pool entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    class: u8,
    status: BlockStatus,
    // intrusive free list links
    pub(super) prev: Option<usize>,
    pub(super) next: Option<usize>,
}

impl Block {
    /// A descriptor that is not part of any block and not linked into any list.
    pub const EMPTY: Block = Block {
        class: 0,
        status: BlockStatus::Reserved,
        prev: None,
        next: None,
    };

    /// The size class of the block this slot represents.
    pub fn class(&self) -> u8 {
        self.class
    }

    /// The current status of this slot.
    pub fn status(&self) -> BlockStatus {
        self.status
    }

    pub(super) fn set(&mut self, class: u8, status: BlockStatus) {
        self.class = class;
        self.status = status;
        self.check();
    }

    pub(super) fn set_status(&mut self, status: BlockStatus) {
        self.status = status;
        self.check();
    }

    /// Returns whether the given physical half of this slot is currently handed out.
    ///
    /// `buddy1` is the low bit of the physical index. For blocks above class `0`
    /// only the even half can be the start of a block.
    pub(super) fn is_live(&self, buddy1: bool) -> bool {
        match self.status {
            BlockStatus::Free => false,
            BlockStatus::Reserved => self.class == 0 || !buddy1,
            BlockStatus::Buddy0Free => self.class == 0 && buddy1,
            BlockStatus::Buddy1Free => self.class == 0 && !buddy1,
        }
    }

    fn check(&self) {
        debug_assert!(
            self.class == 0
                || !matches!(self.status, BlockStatus::Buddy0Free | BlockStatus::Buddy1Free),
            "half free status on a block of class {}",
            self.class
        );
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(class: u8, status: BlockStatus) -> Block {
        let mut block = Block::EMPTY;
        block.set(class, status);
        block
    }

    #[test]
    fn live_halves_at_class_zero() {
        let reserved = block(0, BlockStatus::Reserved);
        assert!(reserved.is_live(false));
        assert!(reserved.is_live(true));

        let b0_free = block(0, BlockStatus::Buddy0Free);
        assert!(!b0_free.is_live(false));
        assert!(b0_free.is_live(true));

        let b1_free = block(0, BlockStatus::Buddy1Free);
        assert!(b1_free.is_live(false));
        assert!(!b1_free.is_live(true));
    }

    #[test]
    fn live_blocks_above_class_zero() {
        let reserved = block(3, BlockStatus::Reserved);
        assert!(reserved.is_live(false));
        // the odd half can never be the start of a class 3 block
        assert!(!reserved.is_live(true));

        assert!(!block(3, BlockStatus::Free).is_live(false));
    }

    #[test]
    #[should_panic(expected = "half free status")]
    #[cfg(debug_assertions)]
    fn half_free_above_class_zero_is_rejected() {
        block(2, BlockStatus::Buddy1Free);
    }
}
