//! Block-level functionality.
//!
//! A block is a fixed-size (4 MiB) unit of storage: a small header followed by a
//! payload region packed with length-prefixed slices. Blocks are filled by a
//! single writer, frozen once, and then read by any number of readers.
//!
//! # Key Components
//!
//! - [`block::Block`]: The write / fetch / checksum / freeze protocol over a
//!   caller-supplied region.
//! - [`header::BlockHeader`]: The 24-byte metadata prefix of every block.
//! - [`reader::SliceReader`]: A private read cursor over a block's slices.
//!
//! # Block Structure
//!
//! ```text
//! +-------------------+---------------------------------------------+
//! |   block header    |                  payload                    |
//! |    (24 bytes)     |        (BLOCK_SIZE - 24 bytes)              |
//! +-------------------+---------------------------------------------+
//! ```
//!
//! Each slice record within the payload:
//!
//! ```text
//! +----------------+----------------+
//! |     length     |      body      |
//! |   (4 bytes)    |  (length bytes)|
//! +----------------+----------------+
//! ```
//!
//! A length of zero marks the end of the written data.

pub mod block;
pub mod header;
pub mod reader;
pub mod utils;

#[cfg(test)]
mod tests;
