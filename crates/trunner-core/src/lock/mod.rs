//! Lock module: the pluggable lock the queue serializes itself with.
//!
//! The queue never implements a synchronization primitive of its own. It only
//! calls `acquire`/`release` around every operation and `destroy` once at teardown.

mod fn_lock;
mod impls;

pub use fn_lock::FnLock;
pub use impls::{NoLock, ParkingLock, SpinLock};

/// Lock port (interface).
///
/// Implementations must provide mutual exclusion between `acquire` and the matching
/// `release`. The queue does not need the lock to be reentrant, and never calls
/// `acquire` twice from the same critical section.
pub trait RawLock {
    /// Block until the lock is held by the caller.
    fn acquire(&self);

    /// Release a lock previously taken with [`RawLock::acquire`].
    ///
    /// # Safety
    /// The lock must be held by the current context.
    unsafe fn release(&self);

    /// Release the resources behind the lock.
    ///
    /// Called exactly once, after the queue has drained its items and released the
    /// lock for the last time. The default does nothing.
    fn destroy(&mut self) {}
}

/// Scoped acquisition of a [`RawLock`].
///
/// `release` runs when the guard goes out of scope, including while unwinding out of
/// a panicking step or completion callback.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, L: RawLock + ?Sized> {
    lock: &'a L,
}

impl<'a, L: RawLock + ?Sized> LockGuard<'a, L> {
    pub fn acquire(lock: &'a L) -> Self {
        lock.acquire();
        Self { lock }
    }
}

impl<L: RawLock + ?Sized> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        // SAFETY: the guard only exists after a successful `acquire`.
        unsafe { self.lock.release() }
    }
}
