//! Ready-made locks.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::lock_api::RawMutex;

use super::RawLock;

/// Native blocking mutex backed by `parking_lot`.
pub struct ParkingLock {
    raw: parking_lot::RawMutex,
}

impl ParkingLock {
    pub const fn new() -> Self {
        Self {
            raw: <parking_lot::RawMutex as RawMutex>::INIT,
        }
    }
}

impl Default for ParkingLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParkingLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParkingLock")
            .field("locked", &self.raw.is_locked())
            .finish()
    }
}

impl RawLock for ParkingLock {
    fn acquire(&self) {
        self.raw.lock();
    }

    unsafe fn release(&self) {
        // SAFETY: forwarded caller contract, the lock is held.
        unsafe { self.raw.unlock() }
    }
}

/// Test-and-test-and-set spin lock.
///
/// Suited to short critical sections only: waiters burn CPU until the holder's
/// whole drive pass finishes.
#[derive(Debug, Default)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }
}

impl RawLock for SpinLock {
    fn acquire(&self) {
        loop {
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    unsafe fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// No-op lock for single-threaded use.
///
/// `NoLock` is `!Sync`, so a queue built on it cannot be shared between threads.
#[derive(Debug, Default)]
pub struct NoLock {
    _not_sync: PhantomData<Cell<()>>,
}

impl NoLock {
    pub const fn new() -> Self {
        Self {
            _not_sync: PhantomData,
        }
    }
}

impl RawLock for NoLock {
    fn acquire(&self) {}

    unsafe fn release(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::LockGuard;
    use rstest::rstest;
    use std::sync::Arc;
    use std::thread;

    /// Increment a counter with a non-atomic read-modify-write under the lock.
    fn hammer<L: RawLock + Send + Sync + 'static>(lock: L) -> u64 {
        struct Shared<L> {
            lock: L,
            counter: std::cell::UnsafeCell<u64>,
        }
        // SAFETY: `counter` is only touched while `lock` is held.
        unsafe impl<L: Sync> Sync for Shared<L> {}

        let shared = Arc::new(Shared {
            lock,
            counter: std::cell::UnsafeCell::new(0),
        });

        let joins: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let _guard = LockGuard::acquire(&shared.lock);
                        unsafe { *shared.counter.get() += 1 };
                    }
                })
            })
            .collect();
        for j in joins {
            j.join().unwrap();
        }

        let _guard = LockGuard::acquire(&shared.lock);
        unsafe { *shared.counter.get() }
    }

    #[rstest]
    #[case::parking(true)]
    #[case::spin(false)]
    fn locks_provide_mutual_exclusion(#[case] parking: bool) {
        let total = if parking {
            hammer(ParkingLock::new())
        } else {
            hammer(SpinLock::new())
        };
        assert_eq!(total, 4_000);
    }

    #[test]
    fn parking_lock_is_unlocked_after_release() {
        let lock = ParkingLock::new();
        lock.acquire();
        assert!(lock.raw.is_locked());
        unsafe { lock.release() };
        assert!(!lock.raw.is_locked());
    }

    #[test]
    fn no_lock_is_free() {
        let lock = NoLock::new();
        let _a = LockGuard::acquire(&lock);
        let _b = LockGuard::acquire(&lock);
    }
}
