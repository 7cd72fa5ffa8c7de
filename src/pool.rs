//! Buddy memory pool and the types shared by its parts.

mod block;
mod buddy;
mod config;
mod free_list;

pub use block::{Block, BlockStatus};
pub use buddy::Pool;
pub use config::{descriptor_count, PoolConfig};
pub use free_list::{FreeList, Iter};

use crate::unit::ByteUnit;
use core::fmt;

/// The smallest exponent a minimum block size may have.
///
/// Blocks below `2^2` bytes are too small to be useful for anything.
pub const MIN_ABSOLUTE_EXPONENT: u8 = 2;

/// The largest exponent a maximum block size may have.
///
/// All byte counts are `u32`, so the largest block is `2^31` bytes.
pub const MAX_ABSOLUTE_EXPONENT: u8 = 31;

/// Result for every pool operation.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Any error that can happen while using a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// {_0}
    Configuration(ConfigError),
    /// cannot allocate {_0} bytes from this pool
    InvalidSize(u32),
    /// tried to free a pointer that is not a live allocation of this pool
    InvalidPointer,
    /// there is no free block large enough for the request
    OutOfMemory,
}

// Hand expansion of `displaydoc_lite::displaydoc!`, whose proc macro panics on
// tuple variants with current compilers. Messages match the doc comments.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(_0) => write!(f, "{}", _0),
            Error::InvalidSize(_0) => write!(f, "cannot allocate {} bytes from this pool", _0),
            Error::InvalidPointer => {
                f.write_str("tried to free a pointer that is not a live allocation of this pool")
            }
            Error::OutOfMemory => f.write_str("there is no free block large enough for the request"),
        }
    }
}

/// Reasons why a pool refused to initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// a storage slice handed to the pool was empty
    MissingStorage,
    /// minimum class exponent {_0} is below the supported minimum
    MinExponentTooSmall(u8),
    /// maximum class exponent is smaller than the minimum class exponent
    MaxExponentBelowMin,
    /// maximum class exponent {_0} exceeds the supported maximum
    MaxExponentTooLarge(u8),
    /// class span {_0} does not match the distance between the class exponents
    ClassSpanMismatch(u8),
    /// the pool needs at least two size classes
    EmptyClassSpan,
    /// the buffer only holds {_0} bytes which is less than the configured total
    BufferTooSmall(usize),
    /// the buffer is larger than a pool can address
    BufferTooLarge,
    /// the total size does not fit a single block of maximum size
    NoMaxBlock,
    /// got {_0} block descriptors which does not match the buffer size
    DescriptorCount(usize),
    /// got {_0} free lists but the pool needs one per size class
    FreeListCount(usize),
}

// Hand expansion of `displaydoc_lite::displaydoc!`, see `Error`.
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingStorage => f.write_str("a storage slice handed to the pool was empty"),
            ConfigError::MinExponentTooSmall(_0) => write!(
                f,
                "minimum class exponent {} is below the supported minimum",
                _0
            ),
            ConfigError::MaxExponentBelowMin => {
                f.write_str("maximum class exponent is smaller than the minimum class exponent")
            }
            ConfigError::MaxExponentTooLarge(_0) => write!(
                f,
                "maximum class exponent {} exceeds the supported maximum",
                _0
            ),
            ConfigError::ClassSpanMismatch(_0) => write!(
                f,
                "class span {} does not match the distance between the class exponents",
                _0
            ),
            ConfigError::EmptyClassSpan => f.write_str("the pool needs at least two size classes"),
            ConfigError::BufferTooSmall(_0) => write!(
                f,
                "the buffer only holds {} bytes which is less than the configured total",
                _0
            ),
            ConfigError::BufferTooLarge => f.write_str("the buffer is larger than a pool can address"),
            ConfigError::NoMaxBlock => {
                f.write_str("the total size does not fit a single block of maximum size")
            }
            ConfigError::DescriptorCount(_0) => write!(
                f,
                "got {} block descriptors which does not match the buffer size",
                _0
            ),
            ConfigError::FreeListCount(_0) => write!(
                f,
                "got {} free lists but the pool needs one per size class",
                _0
            ),
        }
    }
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The pool parameters or storage are inconsistent. Only reported on initialization.
    Configuration,
    /// The caller passed a size or pointer the pool can't handle.
    Argument,
    /// No block of sufficient size is free right now.
    OutOfMemory,
}

impl Error {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::InvalidSize(_) | Error::InvalidPointer => ErrorKind::Argument,
            Error::OutOfMemory => ErrorKind::OutOfMemory,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Configuration(err)
    }
}

/// Statistics for a memory pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocStats {
    /// The name of the pool that collected these stats.
    pub name: &'static str,
    /// The number of bytes inside blocks that are currently handed out.
    pub allocated: usize,
    /// The number of bytes that are left for allocation.
    pub free: usize,
    /// The total number of bytes this pool manages.
    pub total: usize,
    /// Successful allocations.
    pub allocations: usize,
    /// Successful frees.
    pub frees: usize,
    /// Allocations that were rejected.
    pub failed: usize,
    /// Blocks that were split in two.
    pub splits: usize,
    /// Buddies that were merged back together.
    pub merges: usize,
}

impl AllocStats {
    /// Create a new [`AllocStats`] instance for the given pool name.
    pub const fn with_name(name: &'static str) -> Self {
        Self {
            name,
            allocated: 0,
            free: 0,
            total: 0,
            allocations: 0,
            frees: 0,
            failed: 0,
            splits: 0,
            merges: 0,
        }
    }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f, "\nAllocated: {}", ByteUnit(self.allocated))?;
        writeln!(f, "Free: {}", ByteUnit(self.free))?;
        writeln!(f, "Total: {}", ByteUnit(self.total))?;
        writeln!(
            f,
            "Allocations: {} ({} failed), frees: {}",
            self.allocations, self.failed, self.frees
        )?;
        writeln!(f, "Splits: {}, merges: {}", self.splits, self.merges)?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(
            Error::from(ConfigError::NoMaxBlock).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(Error::InvalidSize(0).kind(), ErrorKind::Argument);
        assert_eq!(Error::InvalidPointer.kind(), ErrorKind::Argument);
        assert_eq!(Error::OutOfMemory.kind(), ErrorKind::OutOfMemory);
    }

    #[test]
    fn error_display() {
        let msg = Error::InvalidSize(2048).to_string();
        assert_eq!(msg.trim(), "cannot allocate 2048 bytes from this pool");

        let msg = Error::Configuration(ConfigError::MinExponentTooSmall(1)).to_string();
        assert!(msg.contains("minimum class exponent 1 is below the supported minimum"));
    }

    #[test]
    fn stats_display() {
        let mut stats = AllocStats::with_name("Test Pool");
        stats.total = 2048;
        stats.free = 1024;
        stats.allocated = 1024;

        let out = stats.to_string();
        assert!(out.starts_with("Test Pool\n~~~~~~~~~\n"));
        assert!(out.contains("Allocated: 1.00 KiB"));
        assert!(out.contains("Total: 2.00 KiB"));
    }
}
