//! Slot handles and wait policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque reference to one slot of a pool.
///
/// A handle is only an identifier. The pool stays the sole owner of the slot
/// state, so a stale handle is detected on use rather than aliasing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotHandle(usize);

impl SlotHandle {
    /// Create a handle for the given slot id
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// The slot id this handle refers to
    pub fn id(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What `acquire` does when every slot is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Fail with `PoolExhausted` right away
    Immediate,

    /// Block until a slot is released, or until the timeout elapses
    Block {
        /// Maximum time to wait; `None` waits indefinitely
        timeout: Option<Duration>,
    },
}

impl WaitPolicy {
    /// Fail immediately on exhaustion
    pub fn immediate() -> Self {
        Self::Immediate
    }

    /// Block without a deadline
    pub fn block() -> Self {
        Self::Block { timeout: None }
    }

    /// Block for at most `timeout`
    pub fn block_for(timeout: Duration) -> Self {
        Self::Block {
            timeout: Some(timeout),
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::block()
    }
}
