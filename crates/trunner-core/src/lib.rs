//! trunner-core
//!
//! A minimal cooperative work queue.
//!
//! Callers [`submit`](WorkQueue::submit) work items (an opaque payload, a step
//! function and an optional completion callback). A driver calls
//! [`drive_once`](WorkQueue::drive_once) to run every queued step once; items that
//! report [`Step::Done`] are completed and removed, the rest wait for the next call.
//!
//! # Modules
//! - **queue**: `WorkQueue`, `WorkItem`, `Step`
//! - **lock**: the `RawLock` port the queue serializes itself with, plus ready-made locks
//! - **observability**: `QueueStats`
//! - **error**: `QueueError`
//!
//! ```ignore
//! use trunner_core::{ParkingLock, Step, WorkItem, WorkQueue};
//!
//! let queue = WorkQueue::new(ParkingLock::new());
//! queue.submit(WorkItem::new(3u32, |left| {
//!     *left -= 1;
//!     if *left == 0 { Step::Done } else { Step::Pending }
//! }))?;
//!
//! while queue.drive_once() {}
//! queue.teardown();
//! ```

pub mod error;
pub mod lock;
pub mod observability;
pub mod queue;

pub use error::{QueueError, Result};
pub use lock::{FnLock, LockGuard, NoLock, ParkingLock, RawLock, SpinLock};
pub use observability::QueueStats;
pub use queue::{ItemId, Step, WorkItem, WorkQueue};
