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

//! Fixed-size, append-only storage blocks.

use std::sync::atomic::{fence, Ordering};

use log::{debug, trace, warn};

use crate::blocks::header::BlockHeader;
use crate::blocks::reader::{has_slice_at, read_slice_at, SlicePiece, SliceReader};
use crate::blocks::utils::{self, record_size};
use crate::checksum::crc32;
use crate::constants::{BLOCK_HEADER_SIZE, BLOCK_SIZE, SLICE_LENGTH_SIZE, USABLE_BLOCK_SIZE};
use crate::error::{DiskStoreError, Result};
use crate::slice::Slice;

/// A 4 MiB storage block laid over a caller-supplied region.
///
/// The block never allocates or frees its backing memory: it borrows or owns
/// whatever `B` is (a `Vec<u8>`, a `&mut [u8]` into a mapped file, a pool
/// guard) and hands it back through [`Block::into_inner`].
///
/// A block is opened either for writing, where a single producer appends
/// slices with [`Block::write`] until it returns `false` and then calls
/// [`Block::froze`], or for reading, where [`Block::fetch`] returns the slices
/// in the order they were written. Extra readers with private cursors are
/// available through [`Block::reader`].
///
/// Each slice is stored as a 4-byte little-endian length followed by its body.
/// The body is always stored before its length, so a non-zero length field is
/// only ever observed next to a complete body.
#[derive(Debug)]
pub struct Block<B> {
    header: BlockHeader,
    buffer: B,
    /// Position of the next length field within the backing region.
    cursor: usize,
    read_only: bool,
    remain_size: usize,
}

impl<B: AsRef<[u8]>> Block<B> {
    /// Opens an existing block at `start` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot hold a block at `start` or the
    /// block header is invalid.
    pub fn for_read(buffer: B, start: usize) -> Result<Self> {
        let region = buffer.as_ref();
        utils::validate_region(region.len(), start)?;
        let (header, cursor) = BlockHeader::read_from(region, start)?;

        debug!(
            "Opened block {} at offset {} for reading ({} slices, frozen: {})",
            header.block_number(),
            start,
            header.slice_count(),
            header.is_frozen()
        );

        Ok(Self {
            header,
            buffer,
            cursor,
            read_only: true,
            remain_size: USABLE_BLOCK_SIZE,
        })
    }

    /// Returns the next slice, or `None` once no further slice can be read.
    ///
    /// A length field that points past the end of the block ends the scan:
    /// this and every later call return `None`.
    ///
    /// # Panics
    ///
    /// Panics if the block was opened for writing.
    pub fn fetch(&mut self) -> Option<Slice> {
        assert!(self.read_only, "fetch called on a block opened for writing");

        let end = self.end();
        match read_slice_at(self.buffer.as_ref(), self.cursor, end) {
            SlicePiece::Slice(slice, next) => {
                self.cursor = next;
                Some(slice)
            }
            SlicePiece::End => None,
            SlicePiece::Truncated => {
                warn!(
                    "Truncated slice at offset {} in block {}",
                    self.cursor,
                    self.header.block_number()
                );
                self.cursor = end;
                None
            }
        }
    }

    /// Peeks whether a slice is stored at the current position.
    ///
    /// Returns `false` when too few bytes remain to hold another slice.
    pub fn has_more(&self) -> bool {
        has_slice_at(self.buffer.as_ref(), self.cursor, self.end())
    }

    /// Returns a reader with its own cursor at the first slice of this block.
    pub fn reader(&self) -> SliceReader<'_> {
        SliceReader::new(self.buffer.as_ref(), self.header.start_position())
    }

    /// CRC32 of the whole payload region, unwritten bytes included.
    ///
    /// Does not move the read position.
    pub fn checksum(&self) -> u32 {
        let payload_start = self.header.start_position() + BLOCK_HEADER_SIZE;
        crc32(&self.buffer.as_ref()[payload_start..self.end()])
    }

    pub fn is_frozen(&self) -> bool {
        self.header.is_frozen()
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Payload bytes still available to writes.
    pub fn remain_size(&self) -> usize {
        self.remain_size
    }

    /// Payload bytes consumed by successful writes.
    pub fn used_size(&self) -> usize {
        USABLE_BLOCK_SIZE - self.remain_size
    }

    /// Current position within the backing region.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Returns the backing region, consuming the block.
    pub fn into_inner(self) -> B {
        self.buffer
    }

    fn end(&self) -> usize {
        self.header.start_position() + BLOCK_SIZE
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Block<B> {
    /// Opens a block over `buffer` at `start`, for reading or for writing.
    ///
    /// Only available for mutable backing regions. Open a borrowed read-only
    /// region such as `&[u8]` with [`Block::for_read`].
    pub fn with(buffer: B, start: usize, for_read: bool) -> Result<Self> {
        if for_read {
            Self::for_read(buffer, start)
        } else {
            Self::for_write(buffer, start)
        }
    }

    /// Initializes a fresh block at `start` for writing.
    ///
    /// A new block number is assigned and the payload region is zeroed, so
    /// every byte past the last written slice reads as an empty length.
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot hold a block at `start`.
    pub fn for_write(mut buffer: B, start: usize) -> Result<Self> {
        let region = buffer.as_mut();
        utils::validate_region(region.len(), start)?;
        let (header, cursor) = BlockHeader::init_in(region, start)?;
        region[cursor..start + BLOCK_SIZE].fill(0);

        debug!(
            "Opened block {} at offset {} for writing",
            header.block_number(),
            start
        );

        Ok(Self {
            header,
            buffer,
            cursor,
            read_only: false,
            remain_size: USABLE_BLOCK_SIZE,
        })
    }

    /// Appends a slice to the block.
    ///
    /// Returns `Ok(false)` without touching the block when the slice does not
    /// fit; the caller should freeze this block and continue in a new one.
    ///
    /// # Errors
    ///
    /// Returns [`DiskStoreError::EmptySlice`] for an empty slice.
    ///
    /// # Panics
    ///
    /// Panics if the block was opened for reading or is frozen.
    pub fn write(&mut self, slice: &Slice) -> Result<bool> {
        assert!(!self.read_only, "write called on a block opened for reading");
        assert!(
            !self.header.is_frozen(),
            "write called on frozen block {}",
            self.header.block_number()
        );

        if slice.is_empty() {
            return Err(DiskStoreError::EmptySlice);
        }

        let need = record_size(slice.size());
        if self.remain_size < need {
            return Ok(false);
        }

        let at = self.cursor;
        self.put_body(at, slice);
        // `&mut self` already excludes in-process readers. The fence orders the
        // body before the length for observers of a shared mapping outside
        // this process.
        fence(Ordering::Release);
        self.put_length(at, slice);

        self.header.incr_slice_count();
        self.remain_size -= need;
        self.cursor += need;

        trace!(
            "Wrote slice of {} bytes at offset {} in block {}, {} bytes left",
            slice.size(),
            at,
            self.header.block_number(),
            self.remain_size
        );
        Ok(true)
    }

    /// Freezes the block and persists its header.
    ///
    /// The frozen flag is never cleared; calling this again has no further effect.
    /// On a block opened for reading only the in-memory flag is latched: its
    /// header never counted the slices, so the stored header is left alone.
    pub fn froze(&mut self) {
        if self.read_only {
            self.header.freeze();
            return;
        }
        if !self.header.is_frozen() {
            debug!(
                "Freezing block {} with {} slices ({} bytes used)",
                self.header.block_number(),
                self.header.slice_count(),
                self.used_size()
            );
        }
        self.header.freeze();
        self.header.write_to(self.buffer.as_mut());
    }

    fn put_body(&mut self, at: usize, slice: &Slice) {
        let body_start = at + SLICE_LENGTH_SIZE;
        self.buffer.as_mut()[body_start..body_start + slice.size()].copy_from_slice(slice.as_ref());
    }

    fn put_length(&mut self, at: usize, slice: &Slice) {
        // `need <= remain_size < 4 MiB`, so the length always fits in a u32.
        utils::write_length(self.buffer.as_mut(), at, slice.size() as u32);
    }
}
