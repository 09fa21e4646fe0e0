use serde::{Deserialize, Serialize};

/// Counters for a single queue, updated under the queue's lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Items currently waiting for a drive pass.
    pub queued: usize,
    /// Items accepted by `submit` over the queue's lifetime.
    pub submitted: u64,
    /// Items whose step returned `Done`.
    pub completed: u64,
    /// Drive passes that found at least one item.
    pub passes: u64,
    /// Drive passes that found the queue empty.
    pub idle_passes: u64,
    /// Step invocations across all passes.
    pub steps: u64,
    /// Items dropped by teardown without completing.
    pub drained: u64,
}
