//! A fixed capacity memory pool that hands out power-of-two blocks of a single,
//! caller provided byte buffer using the buddy algorithm.
//!
//! The pool never allocates on its own. The buffer, the block descriptors and the
//! free lists are all borrowed from the caller, which makes it usable in
//! environments without a general purpose heap.
//!
//! ```
//! use mempool::{Block, FreeList, Pool, PoolConfig};
//!
//! let config = PoolConfig::new(1024, 4, 9);
//! let mut buffer = [0u8; 1024];
//! let mut blocks = [Block::EMPTY; 32];
//! let mut lists = [FreeList::EMPTY; 6];
//!
//! let mut pool = Pool::new(config, &mut buffer, &mut blocks, &mut lists).unwrap();
//! let ptr = pool.allocate(100).unwrap();
//! assert_eq!(pool.free_bytes(), 1024 - 128);
//!
//! pool.free(ptr).unwrap();
//! assert_eq!(pool.free_bytes(), 1024);
//! ```

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(test), no_std)]

pub mod pool;
pub mod storage;
pub mod sync;
pub mod unit;

pub use pool::{
    AllocStats, Block, BlockStatus, ConfigError, Error, ErrorKind, FreeList, Pool, PoolConfig,
    Result,
};
