//! Block store trait definition.

use crate::error::StorageResult;
use std::fmt;

/// Address of a block inside a [`BlockStore`].
///
/// Addresses are byte offsets of the block frame. They are handed out by
/// [`BlockStore::write_block`] and never reused by the append-only stores in
/// this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockAddress(pub u64);

impl BlockAddress {
    /// Creates an address from a raw offset.
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self(offset)
    }

    /// Returns the raw offset.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block:{}", self.0)
    }
}

/// A low-level block store.
///
/// Block stores keep opaque byte blocks and hand back an address for each
/// one. They do not interpret the bytes; skipdb stores encoded documents in
/// them and keeps only the addresses in its indexes.
///
/// # Invariants
///
/// - `write_block` returns the address where the block was written
/// - `read_block` returns exactly the bytes previously written at that address
/// - `flush` ensures all written blocks are handed to the OS
/// - Stores must be `Send + Sync` so several readers can share them
pub trait BlockStore: Send + Sync {
    /// Writes a block and returns its address.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is too large or an I/O error occurs.
    fn write_block(&mut self, data: &[u8]) -> StorageResult<BlockAddress>;

    /// Reads the block at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if no block starts at `address`, the frame is damaged,
    /// or an I/O error occurs.
    fn read_block(&self, address: BlockAddress) -> StorageResult<Vec<u8>>;

    /// Flushes pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the size of the store in bytes, which is also the address the
    /// next block will be written at.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;
}
