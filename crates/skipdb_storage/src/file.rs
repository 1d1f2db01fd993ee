//! File-based block store for persistent storage.

use crate::backend::{BlockAddress, BlockStore};
use crate::error::{StorageError, StorageResult};
use crate::frame::{decode_header, encode_header, HEADER_SIZE};
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-based block store.
///
/// Blocks are appended to a single file and survive process restarts.
///
/// # Durability
///
/// - `flush()` calls `File::flush()` to push data to the OS
/// - `sync()` calls `File::sync_all()` to ensure data is on disk
///
/// # Example
///
/// ```no_run
/// use skipdb_storage::{BlockStore, FileBlockStore};
/// use std::path::Path;
///
/// let mut store = FileBlockStore::open(Path::new("documents.dat")).unwrap();
/// let address = store.write_block(b"persistent data").unwrap();
/// store.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBlockStore {
    path: PathBuf,
    file: Mutex<File>,
    size: RwLock<u64>,
}

impl FileBlockStore {
    /// Opens or creates a block store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size: RwLock::new(size),
        })
    }

    /// Opens or creates a block store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_exact_at(file: &mut File, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

impl BlockStore for FileBlockStore {
    fn write_block(&mut self, block: &[u8]) -> StorageResult<BlockAddress> {
        let header = encode_header(block.len())?;

        let mut file = self.file.lock();
        let mut size = self.size.write();

        // Frames start at the tracked size. A torn tail is cut off.
        let address = BlockAddress::new(*size);
        file.seek(SeekFrom::Start(*size))?;
        if let Err(e) = file.write_all(&header).and_then(|()| file.write_all(block)) {
            let _ = file.set_len(*size);
            return Err(e.into());
        }
        *size += (HEADER_SIZE + block.len()) as u64;

        Ok(address)
    }

    fn read_block(&self, address: BlockAddress) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let offset = address.as_u64();

        if offset.saturating_add(HEADER_SIZE as u64) > size {
            return Err(StorageError::BlockNotFound { address: offset });
        }

        let mut file = self.file.lock();
        let header = Self::read_exact_at(&mut file, offset, HEADER_SIZE)?;
        let len = decode_header(offset, &header)?;

        let payload_offset = offset + HEADER_SIZE as u64;
        if payload_offset.saturating_add(len as u64) > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Self::read_exact_at(&mut file, payload_offset, len)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.lock().flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }
}
