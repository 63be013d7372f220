//! Error types for the resource pool.

use crate::config::ConfigError;
use crate::handle::SlotHandle;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`ResourcePool`](crate::ResourcePool) operations
#[derive(Debug, Error)]
pub enum PoolError {
    /// An operation other than `initialize` was called on an unconfigured pool
    #[error("resource pool is not initialized")]
    NotInitialized,

    /// No slot was free and the caller asked not to wait
    #[error("resource pool exhausted")]
    PoolExhausted,

    /// A blocking acquire reached its deadline without getting a slot
    #[error("timed out after {waited:?} waiting for a free slot")]
    Timeout {
        /// How long the caller was blocked
        waited: Duration,
    },

    /// The handle does not name a slot of this pool
    #[error("invalid slot handle {0}")]
    InvalidHandle(SlotHandle),

    /// The handle names a slot that is not currently acquired
    #[error("invalid or inactive slot handle {0}")]
    InactiveHandle(SlotHandle),

    /// `initialize` was given a configuration that failed validation
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl PoolError {
    /// Whether the error means the pool had no capacity for the caller
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::PoolExhausted | Self::Timeout { .. })
    }

    /// Whether retrying the same call later can succeed
    pub fn is_retryable(&self) -> bool {
        self.is_exhausted()
    }
}

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;
