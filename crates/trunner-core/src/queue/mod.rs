//! Queue module: steps, work items and the queue that drives them.

mod item;
mod record;
mod step;
mod work_queue;

pub use item::{CompletionFn, ItemId, StepFn, WorkItem};
pub use step::Step;
pub use work_queue::WorkQueue;

pub(crate) use record::ItemRecord;
