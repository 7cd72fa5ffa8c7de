//! A pool behind a spin lock.
//!
//! [`Pool`] itself is single threaded. If one pool has to be shared, the lock
//! in here serializes every access to it.

use crate::pool::{AllocStats, Pool, Result};
use core::ptr::NonNull;
use spin::{Mutex, MutexGuard};

/// A [`Pool`] that can be shared by reference.
pub struct LockedPool<'a>(Mutex<Pool<'a>>);

impl<'a> LockedPool<'a> {
    /// Wrap `pool` into a lock.
    pub const fn new(pool: Pool<'a>) -> Self {
        Self(Mutex::new(pool))
    }

    /// Allocate a block of at least `size` bytes, see [`Pool::allocate`].
    pub fn allocate(&self, size: u32) -> Result<NonNull<u8>> {
        self.0.lock().allocate(size)
    }

    /// Free the block at `ptr`, see [`Pool::free`].
    pub fn free(&self, ptr: NonNull<u8>) -> Result<()> {
        self.0.lock().free(ptr)
    }

    /// Return the number of free bytes.
    pub fn free_bytes(&self) -> u32 {
        self.0.lock().free_bytes()
    }

    /// Return the statistics for this pool.
    pub fn stats(&self) -> AllocStats {
        self.0.lock().stats()
    }

    /// Lock the pool to perform multiple operations at once.
    pub fn lock(&self) -> MutexGuard<'_, Pool<'a>> {
        self.0.lock()
    }

    /// Unwrap the pool again.
    pub fn into_inner(self) -> Pool<'a> {
        self.0.into_inner()
    }
}
