//! Fixed-capacity pool of reusable slots.
//!
//! The pool owns a table of `max_connections` slots, created once by
//! [`ResourcePool::initialize`]. Callers acquire a slot, use its handle and
//! release it. All slot state lives behind one mutex; blocked acquirers queue
//! in FIFO order and each one waits on its own condition variable, so a
//! release wakes exactly the caller at the head of the queue.

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::guard::SlotGuard;
use crate::handle::{SlotHandle, WaitPolicy};
use crate::status::{PoolStatus, SlotSnapshot};

/// Result of a call to [`ResourcePool::initialize`]
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The slot table was created and the pool is ready
    Initialized,

    /// The pool was already ready; the new configuration was ignored
    AlreadyInitialized,
}

#[derive(Debug)]
struct Slot {
    in_use: bool,
    last_used: DateTime<Utc>,
}

impl Slot {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            in_use: false,
            last_used: now,
        }
    }

    fn set_in_use(&mut self, in_use: bool) {
        self.in_use = in_use;
        self.last_used = Utc::now();
    }
}

/// A caller blocked in `acquire`
#[derive(Debug)]
struct Waiter {
    ticket: u64,
    wakeup: Condvar,
}

#[derive(Debug, Default)]
struct PoolState {
    /// `None` until the pool is initialized
    config: Option<PoolConfig>,

    /// Indexed by slot id; never resized after initialization
    slots: Vec<Slot>,

    /// Blocked acquirers, oldest first
    waiters: VecDeque<Arc<Waiter>>,

    next_ticket: u64,
}

impl PoolState {
    fn ensure_ready(&self) -> Result<()> {
        if self.config.is_some() {
            Ok(())
        } else {
            Err(PoolError::NotInitialized)
        }
    }

    fn slot_mut(&mut self, handle: SlotHandle) -> Result<&mut Slot> {
        self.slots
            .get_mut(handle.id())
            .ok_or(PoolError::InvalidHandle(handle))
    }

    fn has_free_slot(&self) -> bool {
        self.slots.iter().any(|slot| !slot.in_use)
    }

    /// Grant the lowest free slot id, if any
    fn grant(&mut self) -> Option<SlotHandle> {
        let id = self.slots.iter().position(|slot| !slot.in_use)?;
        self.slots[id].set_in_use(true);
        debug!("Slot {} acquired from pool", id);
        Some(SlotHandle::new(id))
    }

    fn enqueue(&mut self) -> Arc<Waiter> {
        let waiter = Arc::new(Waiter {
            ticket: self.next_ticket,
            wakeup: Condvar::new(),
        });
        self.next_ticket += 1;
        self.waiters.push_back(Arc::clone(&waiter));
        trace!(
            "Waiter {} queued ({} waiting)",
            waiter.ticket,
            self.waiters.len()
        );
        waiter
    }

    /// Grant a slot to `waiter` if it is at the head of the queue
    fn take_turn(&mut self, waiter: &Waiter) -> Option<SlotHandle> {
        if !self.is_head(waiter) {
            return None;
        }
        let handle = self.grant()?;
        self.waiters.pop_front();
        self.wake_head();
        Some(handle)
    }

    fn dequeue(&mut self, waiter: &Waiter) {
        self.waiters.retain(|queued| queued.ticket != waiter.ticket);
    }

    fn is_head(&self, waiter: &Waiter) -> bool {
        self.waiters
            .front()
            .is_some_and(|head| head.ticket == waiter.ticket)
    }

    /// Wake the head of the queue if it could make progress
    fn wake_head(&self) {
        if !self.has_free_slot() {
            return;
        }
        if let Some(head) = self.waiters.front() {
            trace!("Waking waiter {}", head.ticket);
            head.wakeup.notify_one();
        }
    }

    fn status(&self) -> PoolStatus {
        let total = self.slots.len();
        let active = self.slots.iter().filter(|slot| slot.in_use).count();
        PoolStatus {
            total,
            active,
            available: total - active,
            waiting: self.waiters.len(),
        }
    }
}

/// A bounded pool of reusable slots
///
/// Construct one per application with [`ResourcePool::new`], initialize it
/// once, and share it (typically behind an `Arc`) with every caller.
#[derive(Debug, Default)]
pub struct ResourcePool {
    state: Mutex<PoolState>,
}

impl ResourcePool {
    /// Create an unconfigured pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool and initialize it with `config`
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        let pool = Self::new();
        let _ = pool.initialize(config)?;
        Ok(pool)
    }

    /// Initialize the pool.
    ///
    /// The first call validates `config` and creates `max_connections` free
    /// slots. Later calls leave the pool untouched, log a warning and return
    /// [`InitOutcome::AlreadyInitialized`].
    pub fn initialize(&self, config: PoolConfig) -> Result<InitOutcome> {
        let mut state = self.state.lock();

        if state.config.is_some() {
            warn!(
                "Resource pool is already initialized with {} slots, ignoring new configuration",
                state.slots.len()
            );
            return Ok(InitOutcome::AlreadyInitialized);
        }

        config.validate()?;

        let now = Utc::now();
        state.slots = (0..config.max_connections).map(|_| Slot::new(now)).collect();
        info!(
            "Resource pool initialized with {} slots for {}",
            config.max_connections,
            config.connection_url()
        );
        state.config = Some(config);

        Ok(InitOutcome::Initialized)
    }

    /// Whether `initialize` has succeeded
    pub fn is_initialized(&self) -> bool {
        self.state.lock().config.is_some()
    }

    /// Acquire the lowest free slot.
    ///
    /// On exhaustion the caller either fails with
    /// [`PoolError::PoolExhausted`] or, under [`WaitPolicy::Block`], joins the
    /// FIFO wait queue until a release hands it a slot or the timeout expires
    /// with [`PoolError::Timeout`]. While callers are queued, new acquirers
    /// never take a slot ahead of them.
    pub fn acquire(&self, policy: WaitPolicy) -> Result<SlotHandle> {
        let mut state = self.state.lock();
        state.ensure_ready()?;

        if state.waiters.is_empty() {
            if let Some(handle) = state.grant() {
                return Ok(handle);
            }
        }

        let timeout = match policy {
            WaitPolicy::Immediate => {
                trace!("No free slot, failing immediately");
                return Err(PoolError::PoolExhausted);
            }
            WaitPolicy::Block { timeout } => timeout,
        };

        let started = Instant::now();
        // A deadline too far out to represent is the same as none.
        let deadline = timeout.and_then(|timeout| started.checked_add(timeout));
        let waiter = state.enqueue();

        loop {
            if let Some(handle) = state.take_turn(&waiter) {
                return Ok(handle);
            }

            match deadline {
                Some(deadline) => {
                    if waiter.wakeup.wait_until(&mut state, deadline).timed_out() {
                        // A release may have raced the deadline.
                        if let Some(handle) = state.take_turn(&waiter) {
                            return Ok(handle);
                        }
                        state.dequeue(&waiter);
                        // A wakeup meant for us may have been consumed by the timeout.
                        state.wake_head();
                        let waited = started.elapsed();
                        debug!(
                            "Waiter {} timed out after {:?} waiting for a slot",
                            waiter.ticket, waited
                        );
                        return Err(PoolError::Timeout { waited });
                    }
                }
                None => waiter.wakeup.wait(&mut state),
            }
        }
    }

    /// Acquire without waiting
    pub fn try_acquire(&self) -> Result<SlotHandle> {
        self.acquire(WaitPolicy::Immediate)
    }

    /// Acquire, waiting at most `timeout` for a slot
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<SlotHandle> {
        self.acquire(WaitPolicy::block_for(timeout))
    }

    /// Acquire a slot that is released when the returned guard is dropped
    pub fn checkout(&self, policy: WaitPolicy) -> Result<SlotGuard<'_>> {
        let handle = self.acquire(policy)?;
        Ok(SlotGuard::new(self, handle))
    }

    /// Return a slot to the pool.
    ///
    /// Releasing a slot that is already free succeeds and changes nothing.
    pub fn release(&self, handle: SlotHandle) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_ready()?;

        let slot = state.slot_mut(handle)?;
        if !slot.in_use {
            debug!("Slot {} already free", handle);
            return Ok(());
        }

        slot.set_in_use(false);
        debug!("Slot {} released back to pool", handle);
        state.wake_head();

        Ok(())
    }

    /// Run `operation` on an acquired slot.
    ///
    /// The handle is checked under the table lock and its `last_used` time is
    /// refreshed; the operation itself runs without holding the lock.
    pub fn execute<T, F>(&self, handle: SlotHandle, operation: F) -> Result<T>
    where
        F: FnOnce(SlotHandle) -> T,
    {
        {
            let mut state = self.state.lock();
            state.ensure_ready()?;

            let slot = state.slot_mut(handle)?;
            if !slot.in_use {
                return Err(PoolError::InactiveHandle(handle));
            }
            slot.last_used = Utc::now();
        }

        trace!("Running operation on slot {}", handle);
        Ok(operation(handle))
    }

    /// Run a query on an acquired slot
    pub fn execute_query(&self, handle: SlotHandle, query: &str) -> Result<()> {
        self.execute(handle, |handle| {
            debug!("Executing query on slot {}: {}", handle, query);
        })
    }

    /// Current occupancy of the pool
    pub fn status(&self) -> Result<PoolStatus> {
        let state = self.state.lock();
        state.ensure_ready()?;
        Ok(state.status())
    }

    /// State of every slot, in id order
    pub fn slots(&self) -> Result<Vec<SlotSnapshot>> {
        let state = self.state.lock();
        state.ensure_ready()?;

        Ok(state
            .slots
            .iter()
            .enumerate()
            .map(|(id, slot)| SlotSnapshot {
                id: SlotHandle::new(id),
                in_use: slot.in_use,
                last_used: slot.last_used,
            })
            .collect())
    }

    /// A copy of the configuration the pool was initialized with
    pub fn config(&self) -> Result<PoolConfig> {
        self.state
            .lock()
            .config
            .clone()
            .ok_or(PoolError::NotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn ready_pool(capacity: usize) -> ResourcePool {
        ResourcePool::with_config(PoolConfig::new(capacity)).unwrap()
    }

    #[test]
    fn test_uninitialized_pool_rejects_operations() {
        let pool = ResourcePool::new();
        assert!(!pool.is_initialized());

        assert!(matches!(pool.try_acquire(), Err(PoolError::NotInitialized)));
        assert!(matches!(
            pool.release(SlotHandle::new(0)),
            Err(PoolError::NotInitialized)
        ));
        assert!(matches!(
            pool.execute_query(SlotHandle::new(0), "SELECT 1"),
            Err(PoolError::NotInitialized)
        ));
        assert!(matches!(pool.status(), Err(PoolError::NotInitialized)));
        assert!(matches!(pool.config(), Err(PoolError::NotInitialized)));
    }

    #[test]
    fn test_initialize_creates_free_slots() {
        let pool = ResourcePool::new();
        let outcome = pool.initialize(PoolConfig::new(4)).unwrap();
        assert_eq!(outcome, InitOutcome::Initialized);

        let status = pool.status().unwrap();
        assert_eq!(status.total, 4);
        assert_eq!(status.active, 0);
        assert_eq!(status.available, 4);

        let slots = pool.slots().unwrap();
        let ids: Vec<usize> = slots.iter().map(|slot| slot.id.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(slots.iter().all(|slot| !slot.in_use));
    }

    #[test]
    fn test_initialize_twice_keeps_first_config() {
        let pool = ResourcePool::new();
        let first = PoolConfig::new(3).with_host("db.example.com");
        assert_eq!(
            pool.initialize(first.clone()).unwrap(),
            InitOutcome::Initialized
        );

        let handle = pool.try_acquire().unwrap();
        let second = PoolConfig::new(8).with_host("another.example.com");
        assert_eq!(
            pool.initialize(second).unwrap(),
            InitOutcome::AlreadyInitialized
        );

        assert_eq!(pool.config().unwrap(), first);
        let status = pool.status().unwrap();
        assert_eq!(status.total, 3);
        assert_eq!(status.active, 1);

        pool.release(handle).unwrap();
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let pool = ResourcePool::new();
        let result = pool.initialize(PoolConfig::new(0));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
        assert!(!pool.is_initialized());

        // A valid config can still be applied afterwards.
        assert_eq!(
            pool.initialize(PoolConfig::new(1)).unwrap(),
            InitOutcome::Initialized
        );
    }

    #[test]
    fn test_low_id_first_and_exhaustion() {
        let pool = ready_pool(3);

        let a = pool.try_acquire().unwrap();
        let b = pool.try_acquire().unwrap();
        let c = pool.try_acquire().unwrap();
        assert_eq!((a.id(), b.id(), c.id()), (0, 1, 2));

        let exhausted = pool.try_acquire().unwrap_err();
        assert!(matches!(exhausted, PoolError::PoolExhausted));
        assert!(exhausted.is_retryable());

        pool.release(b).unwrap();
        assert_eq!(pool.try_acquire().unwrap().id(), 1);
    }

    #[test]
    fn test_release_round_trip_restores_status() {
        let pool = ready_pool(2);
        let before = pool.status().unwrap();

        let handle = pool.try_acquire().unwrap();
        let during = pool.status().unwrap();
        assert_eq!(during.active, 1);
        assert_eq!(during.available, 1);

        pool.release(handle).unwrap();
        assert_eq!(pool.status().unwrap(), before);
    }

    #[test]
    fn test_double_release_is_noop() {
        let pool = ready_pool(2);
        let handle = pool.try_acquire().unwrap();

        pool.release(handle).unwrap();
        let after_first = pool.status().unwrap();
        let last_used = pool.slots().unwrap()[0].last_used;

        pool.release(handle).unwrap();
        assert_eq!(pool.status().unwrap(), after_first);
        assert_eq!(pool.slots().unwrap()[0].last_used, last_used);
    }

    #[test]
    fn test_release_unknown_handle() {
        let pool = ready_pool(2);
        let err = pool.release(SlotHandle::new(2)).unwrap_err();
        assert!(matches!(err, PoolError::InvalidHandle(h) if h.id() == 2));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_execute_requires_acquired_slot() {
        let pool = ready_pool(2);

        assert!(matches!(
            pool.execute_query(SlotHandle::new(0), "SELECT 1"),
            Err(PoolError::InactiveHandle(_))
        ));
        assert!(matches!(
            pool.execute_query(SlotHandle::new(7), "SELECT 1"),
            Err(PoolError::InvalidHandle(_))
        ));

        let handle = pool.try_acquire().unwrap();
        let answer = pool.execute(handle, |h| h.id() + 41).unwrap();
        assert_eq!(answer, 41);

        pool.release(handle).unwrap();
        assert!(matches!(
            pool.execute_query(handle, "SELECT * FROM users"),
            Err(PoolError::InactiveHandle(h)) if h == handle
        ));
    }

    #[test]
    fn test_acquire_and_release_update_last_used() {
        let pool = ready_pool(1);
        let created_at = pool.slots().unwrap()[0].last_used;

        thread::sleep(Duration::from_millis(5));
        let handle = pool.try_acquire().unwrap();
        let acquired_at = pool.slots().unwrap()[0].last_used;
        assert!(acquired_at > created_at);

        thread::sleep(Duration::from_millis(5));
        pool.release(handle).unwrap();
        let released_at = pool.slots().unwrap()[0].last_used;
        assert!(released_at > acquired_at);
    }

    #[test]
    fn test_take_turn_only_serves_head_with_free_slot() {
        let pool = ready_pool(1);
        let mut state = pool.state.lock();

        let first = state.enqueue();
        let second = state.enqueue();
        assert_eq!(state.take_turn(&second), None);

        assert_eq!(state.take_turn(&first), Some(SlotHandle::new(0)));
        assert_eq!(state.waiters.len(), 1);
        assert!(state.is_head(&second));

        // The only slot is taken now.
        assert_eq!(state.take_turn(&second), None);
        assert_eq!(state.waiters.len(), 1);
    }

    #[test]
    fn test_execute_updates_last_used_only() {
        let pool = ready_pool(1);
        let handle = pool.try_acquire().unwrap();
        let acquired_at = pool.slots().unwrap()[0].last_used;

        thread::sleep(Duration::from_millis(5));
        pool.execute_query(handle, "SELECT 1").unwrap();

        let slot = &pool.slots().unwrap()[0];
        assert!(slot.in_use);
        assert!(slot.last_used > acquired_at);
        assert_eq!(pool.status().unwrap().active, 1);
    }

    #[test]
    fn test_immediate_acquire_does_not_jump_queue() {
        let pool = Arc::new(ready_pool(1));
        let held = pool.try_acquire().unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.acquire(WaitPolicy::block()))
        };

        while pool.status().unwrap().waiting == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        pool.release(held).unwrap();
        // Either the slot is still earmarked for the waiter or it already has it.
        assert!(matches!(pool.try_acquire(), Err(PoolError::PoolExhausted)));

        let granted = waiter.join().unwrap().unwrap();
        assert_eq!(granted.id(), 0);
    }

    #[test]
    fn test_blocking_acquire_with_free_slot_returns_at_once() {
        let pool = ready_pool(1);
        let started = Instant::now();
        let handle = pool.acquire_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(handle.id(), 0);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_huge_timeout_waits_like_no_timeout() {
        let pool = Arc::new(ready_pool(1));
        let held = pool.try_acquire().unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.acquire_timeout(Duration::MAX))
        };

        while pool.status().unwrap().waiting == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        pool.release(held).unwrap();

        assert_eq!(waiter.join().unwrap().unwrap().id(), 0);
    }
}
