//! A fixed arena of reusable block buffers.
//!
//! The pool owns `capacity` buffers of `BLOCK_SIZE` bytes, each in its own
//! slot. [`BlockPool::acquire`] hands out a [`BlockLease`] for a free slot.
//! Leases are reference counted: cloning one adds an owner, dropping one
//! releases an owner, and when the last owner is gone the slot goes back on
//! the free list.
//!
//! A lease opens a [`Block`] over its slot buffer. The writer holds the slot's
//! write lock while its block is open, readers share the read lock, and each
//! reader keeps its own cursor.
//!
//! ```rust
//! # use diskstore::pool::block_pool::BlockPool;
//! # use diskstore::slice::Slice;
//! # use diskstore::error::Result;
//! # fn main() -> Result<()> {
//! let pool = BlockPool::new()?;
//! let lease = pool.acquire()?;
//!
//! {
//!     let mut block = lease.open_for_write()?;
//!     block.write(&Slice::from("hello"))?;
//!     block.froze();
//! }
//!
//! let reader_lease = lease.clone();
//! drop(lease);
//!
//! let mut block = reader_lease.open_for_read()?;
//! assert_eq!(block.fetch(), Some(Slice::from("hello")));
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{
    Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use log::{debug, trace, warn};

use crate::blocks::block::Block;
use crate::constants::{BLOCK_SIZE, DEFAULT_POOL_CAPACITY};
use crate::error::{DiskStoreError, Result};
use crate::pool::refcount::{RefCount, RefCounter};

/// Configuration options for a BlockPool.
#[derive(Debug, Clone)]
pub struct BlockPoolConfig {
    /// Number of block buffers the pool allocates.
    pub capacity: usize,
}

impl Default for BlockPoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl BlockPoolConfig {
    /// Creates a config with a custom capacity.
    ///
    /// Returns an error if the capacity is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let config = Self { capacity };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(DiskStoreError::InvalidConfig(
                "Block pool capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Represents the operational state of the pool
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockPoolState {
    /// Leases can be acquired
    Normal,
    /// No further leases are handed out; outstanding leases stay valid
    Closed,
}

/// A pool of reusable `BLOCK_SIZE` buffers.
#[derive(Debug)]
pub struct BlockPool {
    shared: Arc<PoolShared>,
}

#[derive(Debug)]
struct PoolShared {
    slots: Vec<PoolSlot>,
    /// Free list and state, protected by mutex
    inner: Mutex<PoolInner>,
    /// Signalled when a slot is recycled or the pool closes
    signal: Condvar,
}

#[derive(Debug)]
struct PoolInner {
    free: VecDeque<usize>,
    state: BlockPoolState,
}

#[derive(Debug)]
struct PoolSlot {
    data: RwLock<Box<[u8]>>,
    refs: RefCounter,
}

impl BlockPool {
    /// Creates a pool with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(BlockPoolConfig::default())
    }

    /// Creates a pool and allocates all of its buffers up front.
    pub fn with_config(config: BlockPoolConfig) -> Result<Self> {
        config.validate()?;

        let slots = (0..config.capacity)
            .map(|_| PoolSlot {
                data: RwLock::new(vec![0u8; BLOCK_SIZE].into_boxed_slice()),
                refs: RefCounter::new(),
            })
            .collect();

        debug!(
            "Created block pool with {} buffers of {} bytes",
            config.capacity, BLOCK_SIZE
        );

        Ok(Self {
            shared: Arc::new(PoolShared {
                slots,
                inner: Mutex::new(PoolInner {
                    free: (0..config.capacity).collect(),
                    state: BlockPoolState::Normal,
                }),
                signal: Condvar::new(),
            }),
        })
    }

    /// Acquires a lease on a free buffer, waiting until one is recycled.
    ///
    /// # Errors
    ///
    /// Returns [`DiskStoreError::PoolClosed`] if the pool is or becomes closed
    /// while waiting.
    pub fn acquire(&self) -> Result<BlockLease> {
        let mut inner = self.shared.lock()?;
        loop {
            if inner.state == BlockPoolState::Closed {
                return Err(DiskStoreError::PoolClosed(
                    "Cannot acquire from a closed pool".to_string(),
                ));
            }
            if let Some(slot) = inner.free.pop_front() {
                drop(inner);
                return Ok(self.lease(slot));
            }
            inner = self
                .shared
                .signal
                .wait(inner)
                .map_err(|e| DiskStoreError::Other(e.to_string()))?;
        }
    }

    /// Acquires a lease if a buffer is free right now.
    pub fn try_acquire(&self) -> Result<Option<BlockLease>> {
        let mut inner = self.shared.lock()?;
        if inner.state == BlockPoolState::Closed {
            return Err(DiskStoreError::PoolClosed(
                "Cannot acquire from a closed pool".to_string(),
            ));
        }
        let slot = inner.free.pop_front();
        drop(inner);
        Ok(slot.map(|slot| self.lease(slot)))
    }

    /// Closes the pool.
    ///
    /// Waiting and future acquisitions fail. Cannot close an already closed pool.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.shared.lock()?;
        match inner.state {
            BlockPoolState::Closed => Err(DiskStoreError::PoolClosed(
                "Pool is already closed".to_string(),
            )),
            BlockPoolState::Normal => {
                inner.state = BlockPoolState::Closed;
                self.shared.signal.notify_all();
                debug!("Closed block pool with {} free buffers", inner.free.len());
                Ok(())
            }
        }
    }

    pub fn state(&self) -> Result<BlockPoolState> {
        Ok(self.shared.lock()?.state)
    }

    /// Number of buffers not currently leased.
    pub fn available(&self) -> Result<usize> {
        Ok(self.shared.lock()?.free.len())
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    fn lease(&self, slot: usize) -> BlockLease {
        let lease = BlockLease {
            shared: Arc::clone(&self.shared),
            slot,
        };
        lease.incr_ref();
        trace!("Leased pool slot {}", slot);
        lease
    }
}

impl PoolShared {
    fn lock(&self) -> Result<MutexGuard<'_, PoolInner>> {
        self.inner
            .lock()
            .map_err(|e| DiskStoreError::Other(e.to_string()))
    }

    fn release(&self, slot: usize) {
        // The free list stays consistent across a panic elsewhere, so take it
        // back from a poisoned lock.
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.free.push_back(slot);
        trace!("Recycled pool slot {}, {} free", slot, inner.free.len());
        self.signal.notify_one();
    }
}

/// A reference-counted handle on one pool buffer.
///
/// Cloning adds an owner; dropping removes one. The buffer returns to the
/// pool when the last clone is dropped.
#[derive(Debug)]
pub struct BlockLease {
    shared: Arc<PoolShared>,
    slot: usize,
}

impl BlockLease {
    /// Index of the pool slot this lease refers to.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Initializes a fresh block in this buffer and opens it for writing.
    ///
    /// Waits for any open readers or writer of this buffer to finish.
    ///
    /// A lock poisoned by a panic in an earlier block is taken back, since the
    /// whole region is reinitialized here.
    pub fn open_for_write(&self) -> Result<Block<SlotWriteGuard<'_>>> {
        let data = self.slot_data();
        let guard = data.write().unwrap_or_else(|poisoned| {
            warn!("Reclaiming pool slot {} poisoned by a panicked block", self.slot);
            data.clear_poison();
            poisoned.into_inner()
        });
        Block::for_write(SlotWriteGuard(guard), 0)
    }

    /// Opens the block stored in this buffer for reading.
    ///
    /// Waits while a writer holds the buffer. A poisoned lock is taken back:
    /// the header check and the body-before-length ordering still apply to
    /// whatever the panicked writer left behind.
    pub fn open_for_read(&self) -> Result<Block<SlotReadGuard<'_>>> {
        let guard = self.slot_data().read().unwrap_or_else(PoisonError::into_inner);
        Block::for_read(SlotReadGuard(guard), 0)
    }

    fn slot_data(&self) -> &RwLock<Box<[u8]>> {
        &self.shared.slots[self.slot].data
    }
}

impl RefCount for BlockLease {
    fn ref_counter(&self) -> &RefCounter {
        &self.shared.slots[self.slot].refs
    }

    fn recycle(&self) {
        self.shared.release(self.slot);
    }
}

impl Clone for BlockLease {
    fn clone(&self) -> Self {
        self.incr_ref();
        Self {
            shared: Arc::clone(&self.shared),
            slot: self.slot,
        }
    }
}

impl Drop for BlockLease {
    fn drop(&mut self) {
        self.decr_ref();
    }
}

/// Exclusive access to a pool buffer for the lifetime of a writing block.
#[derive(Debug)]
pub struct SlotWriteGuard<'a>(RwLockWriteGuard<'a, Box<[u8]>>);

impl AsRef<[u8]> for SlotWriteGuard<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for SlotWriteGuard<'_> {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// Shared access to a pool buffer for the lifetime of a reading block.
#[derive(Debug)]
pub struct SlotReadGuard<'a>(RwLockReadGuard<'a, Box<[u8]>>);

impl AsRef<[u8]> for SlotReadGuard<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
