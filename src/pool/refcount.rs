//! Reference counting with exactly-once recycling.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::error;

/// An atomic, non-negative reference counter.
#[derive(Debug, Default)]
pub struct RefCounter {
    count: AtomicUsize,
}

impl RefCounter {
    /// Creates a counter at zero.
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    /// Current count. Only a snapshot when other owners are active.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Increments the count and returns the new value.
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the count.
    ///
    /// Returns `Some(true)` for the one call that moves the count from one to
    /// zero, `Some(false)` for any other successful decrement, and `None` when
    /// the count was already zero (the counter is left untouched).
    pub fn decrement(&self) -> Option<bool> {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1))
            .ok()
            .map(|previous| previous == 1)
    }
}

/// A resource that is released exactly once, after its last owner lets go.
///
/// Implementors provide the counter and the [`RefCount::recycle`] hook; the
/// provided methods do the counting.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use diskstore::pool::refcount::{RefCount, RefCounter};
///
/// struct Tracked {
///     refs: RefCounter,
///     recycled: AtomicUsize,
/// }
///
/// impl RefCount for Tracked {
///     fn ref_counter(&self) -> &RefCounter {
///         &self.refs
///     }
///
///     fn recycle(&self) {
///         self.recycled.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let tracked = Tracked { refs: RefCounter::new(), recycled: AtomicUsize::new(0) };
/// tracked.incr_ref();
/// tracked.incr_ref();
/// tracked.decr_ref();
/// assert_eq!(tracked.recycled.load(Ordering::SeqCst), 0);
/// tracked.decr_ref();
/// assert_eq!(tracked.recycled.load(Ordering::SeqCst), 1);
/// ```
pub trait RefCount {
    /// The counter tracking the owners of this resource.
    fn ref_counter(&self) -> &RefCounter;

    /// Releases the resource. Called once per transition of the count to zero.
    fn recycle(&self);

    fn incr_ref(&self) {
        self.ref_counter().increment();
    }

    fn decr_ref(&self) {
        match self.ref_counter().decrement() {
            Some(true) => self.recycle(),
            Some(false) => {}
            None => error!("Reference count decremented below zero, ignoring"),
        }
    }

    fn ref_count(&self) -> usize {
        self.ref_counter().count()
    }
}
