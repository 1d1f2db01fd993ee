//! Error types for block store operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// No block starts at the given address.
    #[error("no block at address {address}")]
    BlockNotFound {
        /// The address that was requested.
        address: u64,
    },

    /// The block header is damaged.
    #[error("block corrupted at address {address}: {message}")]
    Corrupted {
        /// Address of the damaged block.
        address: u64,
        /// What was wrong with it.
        message: String,
    },

    /// The block is larger than a frame can describe.
    #[error("block of {len} bytes exceeds the maximum of {max}")]
    BlockTooLarge {
        /// Length of the rejected block.
        len: usize,
        /// Largest block length a frame can hold.
        max: usize,
    },
}
