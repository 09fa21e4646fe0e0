//! The work queue: FIFO storage + drive-once protocol.

use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use super::{ItemId, ItemRecord, WorkItem};
use crate::error::Result;
use crate::lock::{LockGuard, ParkingLock, RawLock};
use crate::observability::QueueStats;

/// Everything the lock protects.
struct QueueState<P> {
    /// Items in submission order.
    items: VecDeque<ItemRecord<P>>,

    /// Next item ID to assign.
    next_id: u64,

    stats: QueueStats,
}

impl<P> QueueState<P> {
    fn new() -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 1,
            stats: QueueStats::default(),
        }
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = ItemId::new(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Marks the state as borrowed for the lifetime of the value.
///
/// A second borrow while the first is live means the lock let two callers in (a
/// reentrant lock, a broken lock, or a step that calls back into its own queue).
/// That is a caller bug; fail fast instead of aliasing the storage.
struct Borrow<'a> {
    in_use: &'a AtomicBool,
}

impl<'a> Borrow<'a> {
    fn enter(in_use: &'a AtomicBool) -> Self {
        if in_use.swap(true, Ordering::Acquire) {
            panic!(
                "reentrant access to WorkQueue: the lock admitted a second caller while the queue was in use"
            );
        }
        Self { in_use }
    }
}

impl Drop for Borrow<'_> {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
    }
}

/// One drive pass in progress.
///
/// The pass rotates the deque in place: each visited record is popped from the
/// front and, if still pending, pushed to the back. While `unvisited > 0` the deque
/// looks like `[unvisited.., kept..]`; dropping the pass rotates the unvisited
/// records back behind the kept ones and commits the stats, also on unwind.
struct Pass<'a, P> {
    state: &'a mut QueueState<P>,
    unvisited: usize,
    stepped: usize,
    completed: usize,
}

impl<'a, P> Pass<'a, P> {
    fn new(state: &'a mut QueueState<P>) -> Self {
        let unvisited = state.items.len();
        Self {
            state,
            unvisited,
            stepped: 0,
            completed: 0,
        }
    }
}

impl<P> Drop for Pass<'_, P> {
    fn drop(&mut self) {
        let unvisited = self.unvisited;
        self.state.items.rotate_left(unvisited);

        let remaining = self.state.items.len();
        let stats = &mut self.state.stats;
        stats.passes += 1;
        stats.steps += self.stepped as u64;
        stats.completed += self.completed as u64;
        stats.queued = remaining;

        debug!(
            stepped = self.stepped,
            completed = self.completed,
            remaining,
            unvisited,
            "drive pass finished"
        );
    }
}

/// A cooperative work queue.
///
/// Producers [`submit`](WorkQueue::submit) items; a driver calls
/// [`drive_once`](WorkQueue::drive_once) repeatedly to make progress. Each call runs
/// every queued step once, in FIFO order, removes the items that report
/// [`Step::Done`](super::Step::Done) and leaves the rest in place for the next call.
///
/// Every operation takes exactly one acquire/release cycle of the supplied lock
/// around its whole body. Steps and completion callbacks run with the lock held, so
/// they must not call back into the same queue.
///
/// The queue is passive. It never spawns threads and never waits for work.
pub struct WorkQueue<P, L: RawLock = ParkingLock> {
    lock: L,
    in_use: AtomicBool,
    state: UnsafeCell<QueueState<P>>,
    torn_down: bool,
}

// SAFETY: `state` is only reached through `with_state`, which holds the lock and
// a `Borrow`; the `Borrow` flag rules out two live `&mut` even if the lock fails to
// exclude. Items move between threads with the queue, hence `P: Send`.
unsafe impl<P: Send, L: RawLock + Sync> Sync for WorkQueue<P, L> {}

impl<P, L: RawLock> WorkQueue<P, L> {
    /// Create an empty queue bound to `lock`. The queue owns the lock from here on.
    pub fn new(lock: L) -> Self {
        Self {
            lock,
            in_use: AtomicBool::new(false),
            state: UnsafeCell::new(QueueState::new()),
            torn_down: false,
        }
    }

    /// Run `f` on the protected state inside one acquire/release cycle.
    fn with_state<R>(&self, f: impl FnOnce(&mut QueueState<P>) -> R) -> R {
        // Declaration order matters: the borrow is dropped before the lock is released.
        let _guard = LockGuard::acquire(&self.lock);
        let _borrow = Borrow::enter(&self.in_use);
        // SAFETY: `_borrow` guarantees this is the only live reference to the state.
        let state = unsafe { &mut *self.state.get() };
        f(state)
    }

    /// Append an item at the tail of the queue.
    pub fn submit(&self, item: WorkItem<P>) -> Result<ItemId> {
        self.with_state(move |state| -> Result<ItemId> {
            state.items.try_reserve(1)?;

            let id = state.allocate_id();
            state.items.push_back(ItemRecord::new(id, item));
            state.stats.submitted += 1;
            state.stats.queued = state.items.len();

            debug!(item = %id, queued = state.items.len(), "item submitted");
            Ok(id)
        })
    }

    /// Run one pass over the queue.
    ///
    /// Every item's step is invoked once, in submission order. Items whose step
    /// returns `Done` have their completion callback run and are then removed;
    /// `Pending` items stay, keeping their relative order.
    ///
    /// Returns `false` if the queue was empty on entry, `true` otherwise, no matter
    /// how many items completed.
    ///
    /// A panic in a step or callback propagates after the lock is released. The
    /// item whose step panicked stays queued in its place; an item whose completion
    /// callback panicked is removed. Stats for the items visited so far are kept.
    pub fn drive_once(&self) -> bool {
        self.with_state(|state| {
            if state.items.is_empty() {
                state.stats.idle_passes += 1;
                return false;
            }

            let mut pass = Pass::new(state);
            while pass.unvisited > 0 {
                let Some(record) = pass.state.items.front_mut() else {
                    break;
                };
                pass.stepped += 1;
                let step = record.step();

                pass.unvisited -= 1;
                let Some(mut record) = pass.state.items.pop_front() else {
                    break;
                };
                if step.is_done() {
                    pass.completed += 1;
                    trace!(item = %record.id, polls = record.polls, "item completed");
                    record.complete();
                } else {
                    // Capacity was just freed by `pop_front`, so this never reallocates.
                    pass.state.items.push_back(record);
                }
            }
            true
        })
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.with_state(|state| state.items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the queue's counters.
    pub fn stats(&self) -> QueueStats {
        self.with_state(|state| state.stats.clone())
    }

    /// Drain and destroy the queue.
    ///
    /// Every remaining item is dropped without running its completion callback,
    /// then the lock's `destroy` runs. Returns the number of items drained.
    ///
    /// Dropping the queue does the same thing; `teardown` just makes it explicit.
    pub fn teardown(mut self) -> usize {
        self.shutdown()
    }

    fn shutdown(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;

        let drained = self.with_state(|state| {
            let drained = state.items.len();
            state.items.clear();
            state.stats.drained += drained as u64;
            state.stats.queued = 0;
            drained
        });

        self.lock.destroy();
        debug!(drained, "queue torn down");
        drained
    }
}

impl<P, L: RawLock + Default> Default for WorkQueue<P, L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<P, L: RawLock> Drop for WorkQueue<P, L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
