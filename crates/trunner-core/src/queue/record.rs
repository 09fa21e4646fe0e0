//! Item record: queue metadata + work item.

use super::{ItemId, Step, WorkItem};

/// What the queue actually stores per entry.
///
/// The `WorkItem` is exclusively owned by the record from `submit` until the record
/// is removed, either after completing or by teardown.
pub(crate) struct ItemRecord<P> {
    pub id: ItemId,

    /// Number of times the step has been invoked.
    pub polls: u32,

    pub item: WorkItem<P>,
}

impl<P> ItemRecord<P> {
    pub fn new(id: ItemId, item: WorkItem<P>) -> Self {
        Self { id, polls: 0, item }
    }

    /// Invoke the step once.
    pub fn step(&mut self) -> Step {
        self.polls = self.polls.saturating_add(1);
        self.item.step()
    }

    /// Run the completion callback. Called once the step has returned `Done`.
    pub fn complete(&mut self) {
        self.item.complete();
    }
}
