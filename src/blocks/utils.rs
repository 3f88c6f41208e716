//! Common utilities for block operations.

use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{BLOCK_SIZE, SLICE_LENGTH_SIZE};
use crate::error::{DiskStoreError, Result};

/// Validates that a region of `available` bytes can hold a whole block at `start`.
///
/// # Arguments
///
/// * `available` - Length of the backing region
/// * `start` - Offset of the block header within the region
pub fn validate_region(available: usize, start: usize) -> Result<()> {
    match start.checked_add(BLOCK_SIZE) {
        Some(end) if end <= available => Ok(()),
        _ => Err(DiskStoreError::RegionTooSmall {
            start,
            required: BLOCK_SIZE,
            available,
        }),
    }
}

/// Bytes a slice body of `len` bytes occupies in a block, length prefix included.
pub fn record_size(len: usize) -> usize {
    len + SLICE_LENGTH_SIZE
}

/// Reads the slice length field stored at `pos`.
///
/// The caller guarantees `pos + SLICE_LENGTH_SIZE <= buf.len()`.
pub fn read_length(buf: &[u8], pos: usize) -> u32 {
    LittleEndian::read_u32(&buf[pos..pos + SLICE_LENGTH_SIZE])
}

/// Stores a slice length field at `pos`.
pub fn write_length(buf: &mut [u8], pos: usize, len: u32) {
    LittleEndian::write_u32(&mut buf[pos..pos + SLICE_LENGTH_SIZE], len);
}
