//! Sequential slice reading over block bytes.

use log::warn;

use crate::blocks::utils::{read_length, record_size};
use crate::constants::{BLOCK_HEADER_SIZE, BLOCK_SIZE, SLICE_LENGTH_SIZE};
use crate::slice::Slice;

/// Result of attempting to read the slice at a cursor.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SlicePiece {
    /// A complete slice and the cursor just past it.
    Slice(Slice, usize),
    /// No slice is stored at the cursor.
    End,
    /// The length field claims more bytes than the block has left.
    Truncated,
}

/// Reads the slice stored at `cursor`, where `end` is one past the last
/// payload byte of the block.
///
/// A slice is only considered when more than `SLICE_LENGTH_SIZE` bytes remain,
/// so a length field is never read past `end`.
pub(crate) fn read_slice_at(buf: &[u8], cursor: usize, end: usize) -> SlicePiece {
    if end.saturating_sub(cursor) <= SLICE_LENGTH_SIZE {
        return SlicePiece::End;
    }

    let len = read_length(buf, cursor) as usize;
    if len == 0 {
        return SlicePiece::End;
    }

    let body_start = cursor + SLICE_LENGTH_SIZE;
    if end - body_start < len {
        return SlicePiece::Truncated;
    }

    let slice = Slice::copy_from(&buf[body_start..body_start + len]);
    SlicePiece::Slice(slice, cursor + record_size(len))
}

/// Whether a non-empty length field is stored at `cursor`.
pub(crate) fn has_slice_at(buf: &[u8], cursor: usize, end: usize) -> bool {
    end.saturating_sub(cursor) > SLICE_LENGTH_SIZE && read_length(buf, cursor) != 0
}

/// A reader with its own cursor over the payload of one block.
///
/// Readers never share a position, so any number of them can scan the same
/// frozen bytes from different threads.
///
/// # Example
///
/// ```
/// use diskstore::blocks::block::Block;
/// use diskstore::constants::BLOCK_SIZE;
/// use diskstore::slice::Slice;
///
/// let mut block = Block::for_write(vec![0u8; BLOCK_SIZE], 0).unwrap();
/// block.write(&Slice::from("first")).unwrap();
/// block.write(&Slice::from("second")).unwrap();
///
/// let bodies: Vec<_> = block.reader().map(|s| s.into_bytes()).collect();
/// assert_eq!(bodies, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    /// The backing region the block lives in.
    buf: &'a [u8],

    /// Position of the next length field.
    cursor: usize,

    /// One past the last payload byte of the block.
    end: usize,
}

impl<'a> SliceReader<'a> {
    /// Creates a reader for the block whose header starts at `start`.
    ///
    /// The caller guarantees the block lies within `buf`.
    pub(crate) fn new(buf: &'a [u8], start: usize) -> Self {
        Self {
            buf,
            cursor: start + BLOCK_HEADER_SIZE,
            end: start + BLOCK_SIZE,
        }
    }

    /// Returns the next slice, or `None` once no further slice can be read.
    pub fn fetch(&mut self) -> Option<Slice> {
        match read_slice_at(self.buf, self.cursor, self.end) {
            SlicePiece::Slice(slice, next) => {
                self.cursor = next;
                Some(slice)
            }
            SlicePiece::End => None,
            SlicePiece::Truncated => {
                warn!(
                    "Truncated slice at offset {}, stopping this reader",
                    self.cursor
                );
                self.cursor = self.end;
                None
            }
        }
    }

    /// Peeks whether another slice is stored at the cursor.
    pub fn has_more(&self) -> bool {
        has_slice_at(self.buf, self.cursor, self.end)
    }

    /// Current cursor within the backing region.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl Iterator for SliceReader<'_> {
    type Item = Slice;

    fn next(&mut self) -> Option<Self::Item> {
        self.fetch()
    }
}
