//! Scoped slot ownership.

use log::warn;

use crate::error::Result;
use crate::handle::SlotHandle;
use crate::pool::ResourcePool;

/// An acquired slot that goes back to its pool when dropped
#[derive(Debug)]
pub struct SlotGuard<'a> {
    pool: &'a ResourcePool,
    handle: SlotHandle,
    released: bool,
}

impl<'a> SlotGuard<'a> {
    pub(crate) fn new(pool: &'a ResourcePool, handle: SlotHandle) -> Self {
        Self {
            pool,
            handle,
            released: false,
        }
    }

    /// Handle of the guarded slot.
    ///
    /// The guard releases this handle itself. Passing it to
    /// [`ResourcePool::release`] as well would let the drop release the slot
    /// again after another caller has acquired it.
    pub fn handle(&self) -> SlotHandle {
        self.handle
    }

    /// Run `operation` on the guarded slot
    pub fn execute<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(SlotHandle) -> T,
    {
        self.pool.execute(self.handle, operation)
    }

    /// Release the slot now instead of on drop
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.pool.release(self.handle)
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.pool.release(self.handle) {
            warn!("Failed to release slot {} on drop: {}", self.handle, e);
        }
    }
}
