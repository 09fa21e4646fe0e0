//! Work item: payload + step + optional completion callback.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Step;

/// Identifier assigned by `WorkQueue::submit`, unique within one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

pub type StepFn<P> = Box<dyn FnMut(&mut P) -> Step + Send>;
pub type CompletionFn<P> = Box<dyn FnOnce(&mut P) + Send>;

/// A unit of work waiting in a queue.
///
/// The queue carries `payload` and hands it to `step` (and, once, to the completion
/// callback) without ever looking at it. A step that needs several invocations keeps
/// its progress inside the payload and returns [`Step::Pending`] until it is done.
///
/// ```ignore
/// let item = WorkItem::new(3u32, |left| {
///     *left -= 1;
///     if *left == 0 { Step::Done } else { Step::Pending }
/// })
/// .on_complete(|_| println!("finished"));
/// queue.submit(item)?;
/// ```
pub struct WorkItem<P> {
    pub(crate) payload: P,
    pub(crate) step: StepFn<P>,
    pub(crate) on_complete: Option<CompletionFn<P>>,
}

impl<P> WorkItem<P> {
    pub fn new<S>(payload: P, step: S) -> Self
    where
        S: FnMut(&mut P) -> Step + Send + 'static,
    {
        Self {
            payload,
            step: Box::new(step),
            on_complete: None,
        }
    }

    /// Attach the callback that runs right after the step returns `Done`.
    pub fn on_complete<C>(mut self, callback: C) -> Self
    where
        C: FnOnce(&mut P) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn has_completion(&self) -> bool {
        self.on_complete.is_some()
    }

    /// Run the step once.
    pub(crate) fn step(&mut self) -> Step {
        (self.step)(&mut self.payload)
    }

    /// Run the completion callback, if any. Subsequent calls do nothing.
    pub(crate) fn complete(&mut self) {
        if let Some(callback) = self.on_complete.take() {
            callback(&mut self.payload);
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for WorkItem<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("payload", &self.payload)
            .field("has_completion", &self.has_completion())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn step_sees_and_updates_payload() {
        let mut item = WorkItem::new(2u32, |left| {
            *left -= 1;
            Step::from_code(*left as i32)
        });
        assert_eq!(item.step(), Step::Pending);
        assert_eq!(item.step(), Step::Done);
        assert_eq!(*item.payload(), 0);
    }

    #[test]
    fn completion_runs_once() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let mut item = WorkItem::new((), |_| Step::Done).on_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(item.has_completion());

        item.complete();
        item.complete();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!item.has_completion());
    }

    #[test]
    fn item_id_display() {
        assert_eq!(ItemId::new(7).to_string(), "item-7");
    }
}
