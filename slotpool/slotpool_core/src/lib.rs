#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Slotpool Core
//!
//! A bounded pool of reusable slots, such as database connections, shared by
//! concurrent callers.
//!
//! The pool is created explicitly by the application and initialized once
//! with a [`PoolConfig`]. Callers acquire a [`SlotHandle`], use it through
//! [`ResourcePool::execute`] and give it back with [`ResourcePool::release`].
//! When every slot is in use, [`WaitPolicy`] decides whether `acquire` fails
//! or blocks in a FIFO queue until a slot is released or a deadline passes.
//!
//! ```
//! use slotpool_core::{PoolConfig, ResourcePool, WaitPolicy};
//!
//! let pool = ResourcePool::new();
//! let _ = pool.initialize(PoolConfig::new(2)).unwrap();
//!
//! let handle = pool.acquire(WaitPolicy::immediate()).unwrap();
//! pool.execute_query(handle, "SELECT 1").unwrap();
//! pool.release(handle).unwrap();
//!
//! assert_eq!(pool.status().unwrap().available, 2);
//! ```

/// Pool configuration and its loading
pub mod config;

/// Error taxonomy for pool operations
pub mod error;

/// Scoped slot ownership
pub mod guard;

/// Slot handles and wait policies
pub mod handle;

/// The slot table and its acquire/release protocol
pub mod pool;

/// Occupancy snapshots
pub mod status;

pub use config::{ConfigError, PoolConfig};
pub use error::{PoolError, Result};
pub use guard::SlotGuard;
pub use handle::{SlotHandle, WaitPolicy};
pub use pool::{InitOutcome, ResourcePool};
pub use status::{PoolStatus, SlotSnapshot};
