// Copyright 2024
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Block header definition, parsing and serialization.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{Buf, BufMut};

use crate::checksum::crc32;
use crate::constants::{BLOCK_FROZEN, BLOCK_HEADER_SIZE, BLOCK_MAGIC, BLOCK_OPEN};
use crate::error::{DiskStoreError, Result};

/// Bytes of the header covered by the header checksum.
const HEADER_CRC_OFFSET: usize = BLOCK_HEADER_SIZE - 4;

/// Process-wide block sequence counter.
static BLOCK_NUMBER: AtomicU64 = AtomicU64::new(0);

/// Returns the next block number. Numbers start at 1 and strictly increase.
pub fn next_block_number() -> u64 {
    BLOCK_NUMBER.fetch_add(1, Ordering::Relaxed) + 1
}

/// Metadata stored in the first `BLOCK_HEADER_SIZE` bytes of every block.
///
/// The serialized header is 24 bytes, all integers little-endian:
/// - magic (4 bytes): `BLOCK_MAGIC`
/// - slice_count (4 bytes): slices written, persisted on init and freeze
/// - block_number (8 bytes): global sequence number used to order blocks
/// - frozen (1 byte): `BLOCK_OPEN` or `BLOCK_FROZEN`
/// - reserved (3 bytes): zero
/// - header_crc (4 bytes): CRC32 of the preceding 20 bytes
///
/// `start_position` is not serialized; it records where in its backing region
/// the block was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    block_number: u64,
    slice_count: u32,
    frozen: u8,
    start_position: usize,
}

impl BlockHeader {
    /// Creates a fresh header for a block starting at `start_position`,
    /// assigning it the next block number.
    pub fn new(start_position: usize) -> Self {
        Self {
            block_number: next_block_number(),
            slice_count: 0,
            frozen: BLOCK_OPEN,
            start_position,
        }
    }

    /// Initializes a fresh header and serializes it at `start`.
    ///
    /// Returns the header and the position of the first payload byte.
    pub fn init_in(buf: &mut [u8], start: usize) -> Result<(Self, usize)> {
        ensure_header_fits(buf.len(), start)?;
        let header = Self::new(start);
        header.write_to(buf);
        Ok((header, start + BLOCK_HEADER_SIZE))
    }

    /// Parses an existing header at `start`.
    ///
    /// Returns the header and the position of the first payload byte.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The buffer is too short to hold a header at `start`
    /// - The magic number is wrong
    /// - The header checksum does not match
    /// - The frozen flag holds an unknown value
    pub fn read_from(buf: &[u8], start: usize) -> Result<(Self, usize)> {
        ensure_header_fits(buf.len(), start)?;
        let raw = &buf[start..start + BLOCK_HEADER_SIZE];

        let computed = crc32(&raw[..HEADER_CRC_OFFSET]);
        let mut fields = raw;

        let magic = fields.get_u32_le();
        if magic != BLOCK_MAGIC {
            return Err(DiskStoreError::InvalidBlockHeader(format!(
                "bad magic {:#010x} at offset {}",
                magic, start
            )));
        }

        let slice_count = fields.get_u32_le();
        let block_number = fields.get_u64_le();
        let frozen = fields.get_u8();
        fields.advance(3);

        let stored = fields.get_u32_le();
        if stored != computed {
            return Err(DiskStoreError::BlockHeaderChecksumMismatch { stored, computed });
        }

        if frozen != BLOCK_OPEN && frozen != BLOCK_FROZEN {
            return Err(DiskStoreError::InvalidBlockHeader(format!(
                "unknown frozen flag {}",
                frozen
            )));
        }

        let header = Self {
            block_number,
            slice_count,
            frozen,
            start_position: start,
        };
        Ok((header, start + BLOCK_HEADER_SIZE))
    }

    /// Serializes this header at its start position.
    ///
    /// The caller guarantees the header fits, which holds for any buffer the
    /// header was initialized in or read from.
    pub fn write_to(&self, buf: &mut [u8]) {
        let start = self.start_position;
        let raw = &mut buf[start..start + BLOCK_HEADER_SIZE];
        {
            let mut out = &mut raw[..];
            out.put_u32_le(BLOCK_MAGIC);
            out.put_u32_le(self.slice_count);
            out.put_u64_le(self.block_number);
            out.put_u8(self.frozen);
            out.put_bytes(0, 3);
        }
        let crc = crc32(&raw[..HEADER_CRC_OFFSET]);
        (&mut raw[HEADER_CRC_OFFSET..]).put_u32_le(crc);
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn slice_count(&self) -> u32 {
        self.slice_count
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen == BLOCK_FROZEN
    }

    /// Offset of this header within the backing region.
    pub fn start_position(&self) -> usize {
        self.start_position
    }

    /// Latches the frozen flag. It is never cleared.
    pub fn freeze(&mut self) {
        self.frozen = BLOCK_FROZEN;
    }

    pub(crate) fn incr_slice_count(&mut self) {
        self.slice_count += 1;
    }
}

fn ensure_header_fits(available: usize, start: usize) -> Result<()> {
    match start.checked_add(BLOCK_HEADER_SIZE) {
        Some(end) if end <= available => Ok(()),
        _ => Err(DiskStoreError::RegionTooSmall {
            start,
            required: BLOCK_HEADER_SIZE,
            available,
        }),
    }
}
