//! # skipdb Storage
//!
//! Block store trait and implementations for skipdb.
//!
//! This crate is the lowest layer of skipdb. A block store keeps opaque byte
//! blocks and returns a [`BlockAddress`] for each one; skipdb writes encoded
//! documents into it and indexes refer to documents only by address.
//!
//! ## Available Stores
//!
//! - [`InMemoryBlockStore`] - For testing and ephemeral collections
//! - [`FileBlockStore`] - Append-only file using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use skipdb_storage::{BlockStore, InMemoryBlockStore};
//!
//! let mut store = InMemoryBlockStore::new();
//! let address = store.write_block(b"hello world").unwrap();
//! assert_eq!(store.read_block(address).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod frame;
mod memory;

pub use backend::{BlockAddress, BlockStore};
pub use error::{StorageError, StorageResult};
pub use file::FileBlockStore;
pub use memory::InMemoryBlockStore;

impl<S: BlockStore + ?Sized> BlockStore for Box<S> {
    fn write_block(&mut self, data: &[u8]) -> StorageResult<BlockAddress> {
        (**self).write_block(data)
    }

    fn read_block(&self, address: BlockAddress) -> StorageResult<Vec<u8>> {
        (**self).read_block(address)
    }

    fn flush(&mut self) -> StorageResult<()> {
        (**self).flush()
    }

    fn sync(&mut self) -> StorageResult<()> {
        (**self).sync()
    }

    fn size(&self) -> StorageResult<u64> {
        (**self).size()
    }
}
