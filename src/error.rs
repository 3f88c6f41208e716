//! Error types for diskstore.

use std::io;
use thiserror::Error;

/// The main error type for diskstore operations.
#[derive(Debug, Error)]
pub enum DiskStoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing region cannot hold a whole block at the requested offset.
    #[error("Backing region too small: a block at offset {start} needs {required} bytes, region has {available}")]
    RegionTooSmall {
        start: usize,
        required: usize,
        available: usize,
    },

    /// The block header bytes are not a valid header.
    #[error("Invalid block header: {0}")]
    InvalidBlockHeader(String),

    /// The stored block header checksum does not match its contents.
    #[error("Block header checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    BlockHeaderChecksumMismatch { stored: u32, computed: u32 },

    /// Empty slices cannot be stored, a zero length marks the end of data.
    #[error("Cannot write an empty slice")]
    EmptySlice,

    /// Occurs when acquiring from a closed pool.
    #[error("Block pool is closed: {0}")]
    PoolClosed(String),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A general error occurred.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for diskstore operations.
pub type Result<T> = std::result::Result<T, DiskStoreError>;
