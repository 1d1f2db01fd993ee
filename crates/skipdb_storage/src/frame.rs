//! Block framing shared by the store implementations.
//!
//! Each block is written as an 8-byte header followed by the payload:
//!
//! ```text
//! | len: u32 LE | !len: u32 LE | payload ... |
//! ```
//!
//! The inverted copy of the length lets a reader reject addresses that do not
//! point at the start of a frame.

use crate::error::{StorageError, StorageResult};

/// Size of the frame header in bytes.
pub(crate) const HEADER_SIZE: usize = 8;

/// Largest payload a frame can hold.
pub(crate) const MAX_BLOCK_SIZE: usize = u32::MAX as usize;

/// Builds the header for a payload of `len` bytes.
pub(crate) fn encode_header(len: usize) -> StorageResult<[u8; HEADER_SIZE]> {
    let len32 = u32::try_from(len).map_err(|_| StorageError::BlockTooLarge {
        len,
        max: MAX_BLOCK_SIZE,
    })?;
    let mut header = [0u8; HEADER_SIZE];
    header[..4].copy_from_slice(&len32.to_le_bytes());
    header[4..].copy_from_slice(&(!len32).to_le_bytes());
    Ok(header)
}

/// Parses a header read at `address` and returns the payload length.
pub(crate) fn decode_header(address: u64, header: &[u8]) -> StorageResult<usize> {
    if header.len() != HEADER_SIZE {
        return Err(StorageError::BlockNotFound { address });
    }
    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let check = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if len != !check {
        return Err(StorageError::BlockNotFound { address });
    }
    Ok(len as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = encode_header(300).unwrap();
        assert_eq!(decode_header(0, &header).unwrap(), 300);
    }

    #[test]
    fn misaligned_header_is_rejected() {
        let mut bytes = encode_header(300).unwrap().to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            decode_header(2, &bytes[2..10]),
            Err(StorageError::BlockNotFound { address: 2 })
        ));
    }
}
