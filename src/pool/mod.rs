//! Pooling of block buffers.
//!
//! - [`refcount`]: the [`refcount::RefCount`] capability, recycling a resource
//!   exactly once when its last owner releases it.
//! - [`block_pool`]: a fixed arena of `BLOCK_SIZE` buffers whose leases are
//!   reference counted and return their slot to the free list on recycle.

pub mod block_pool;
pub mod refcount;
