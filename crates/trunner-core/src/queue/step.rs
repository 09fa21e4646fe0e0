//! Result of a single step invocation.

use serde::{Deserialize, Serialize};

/// What a step reports back to the queue after one invocation.
///
/// Transitions of the item that owns the step:
/// - Queued -> (step returns Pending) -> Queued
/// - Queued -> (step returns Done) -> completion callback -> Removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    /// The work is finished; the item leaves the queue.
    Done,

    /// More invocations are needed; the item stays where it is.
    Pending,
}

impl Step {
    /// Interpret an integer status: `0` is `Done`, anything else is `Pending`.
    pub fn from_code(code: i32) -> Self {
        if code == 0 { Step::Done } else { Step::Pending }
    }

    pub fn code(self) -> i32 {
        match self {
            Step::Done => 0,
            Step::Pending => 1,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Step::Done)
    }
}
