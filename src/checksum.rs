//! Checksum functionality for diskstore blocks.

use crc32fast::Hasher;

/// Calculate the CRC32 (IEEE) of a byte region.
///
/// A new hasher is used for every call, so results never depend on
/// previously checksummed data.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
