//! In-memory block store for testing.

use crate::backend::{BlockAddress, BlockStore};
use crate::error::{StorageError, StorageResult};
use crate::frame::{decode_header, encode_header, HEADER_SIZE};
use parking_lot::RwLock;

/// An in-memory block store.
///
/// This store keeps all blocks in a single buffer and is suitable for:
/// - Unit tests
/// - Ephemeral collections that don't need persistence
///
/// # Example
///
/// ```rust
/// use skipdb_storage::{BlockStore, InMemoryBlockStore};
///
/// let mut store = InMemoryBlockStore::new();
/// let address = store.write_block(b"hello").unwrap();
/// assert_eq!(store.read_block(address).unwrap(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    data: RwLock<Vec<u8>>,
}

impl InMemoryBlockStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for InMemoryBlockStore {
    fn write_block(&mut self, block: &[u8]) -> StorageResult<BlockAddress> {
        let header = encode_header(block.len())?;
        let mut data = self.data.write();
        let address = BlockAddress::new(data.len() as u64);
        data.extend_from_slice(&header);
        data.extend_from_slice(block);
        Ok(address)
    }

    fn read_block(&self, address: BlockAddress) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let offset = address.as_u64();

        let start = usize::try_from(offset)
            .map_err(|_| StorageError::BlockNotFound { address: offset })?;
        let payload_start = start.saturating_add(HEADER_SIZE);
        if payload_start > data.len() {
            return Err(StorageError::BlockNotFound { address: offset });
        }

        let len = decode_header(offset, &data[start..payload_start])?;
        let end = payload_start.saturating_add(len);
        if end > data.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[payload_start..end].to_vec())
    }

    fn flush(&mut self) -> StorageResult<()> {
        // Nothing is buffered
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_read_blocks() {
        let mut store = InMemoryBlockStore::new();

        let a = store.write_block(b"first").unwrap();
        let b = store.write_block(b"second block").unwrap();

        assert_eq!(a, BlockAddress::new(0));
        assert_eq!(b, BlockAddress::new((HEADER_SIZE + 5) as u64));
        assert_eq!(store.read_block(a).unwrap(), b"first");
        assert_eq!(store.read_block(b).unwrap(), b"second block");
    }

    #[test]
    fn empty_block() {
        let mut store = InMemoryBlockStore::new();
        let a = store.write_block(b"").unwrap();
        assert!(store.read_block(a).unwrap().is_empty());
        assert_eq!(store.size().unwrap(), HEADER_SIZE as u64);
    }

    #[test]
    fn unknown_address_is_rejected() {
        let mut store = InMemoryBlockStore::new();
        store.write_block(b"payload bytes").unwrap();

        assert!(matches!(
            store.read_block(BlockAddress::new(3)),
            Err(StorageError::BlockNotFound { address: 3 })
        ));
        assert!(matches!(
            store.read_block(BlockAddress::new(10_000)),
            Err(StorageError::BlockNotFound { .. })
        ));
    }
}
