//! Function-table lock: an opaque handle plus the operations that drive it.

use std::fmt;

use super::RawLock;

/// A lock made of a caller-owned handle and plain function pointers.
///
/// This is the shape to use when the mutex lives outside Rust's type system (an
/// FFI handle, a lock shared with another subsystem, ...). `destroy` is optional;
/// when it is `None` teardown leaves the handle alone.
///
/// ```ignore
/// let lock = FnLock::new(
///     parking_lot::RawMutex::INIT,
///     |m| m.lock(),
///     |m| unsafe { m.unlock() },
///     None,
/// );
/// ```
pub struct FnLock<H> {
    handle: H,
    acquire: fn(&H),
    release: fn(&H),
    destroy: Option<fn(&mut H)>,
    destroyed: bool,
}

impl<H> FnLock<H> {
    pub fn new(
        handle: H,
        acquire: fn(&H),
        release: fn(&H),
        destroy: Option<fn(&mut H)>,
    ) -> Self {
        Self {
            handle,
            acquire,
            release,
            destroy,
            destroyed: false,
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Has `destroy` already run on the handle?
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<H> RawLock for FnLock<H> {
    fn acquire(&self) {
        (self.acquire)(&self.handle)
    }

    unsafe fn release(&self) {
        (self.release)(&self.handle)
    }

    fn destroy(&mut self) {
        // The handle must not see `destroy` twice.
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let Some(destroy) = self.destroy {
            destroy(&mut self.handle);
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for FnLock<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLock")
            .field("handle", &self.handle)
            .field("has_destroy", &self.destroy.is_some())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
