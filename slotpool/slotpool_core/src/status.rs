//! Point-in-time views of the pool.

use crate::handle::SlotHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the pool's occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Fixed capacity of the pool
    pub total: usize,

    /// Slots currently acquired
    pub active: usize,

    /// Slots currently free (`total - active`)
    pub available: usize,

    /// Callers blocked in `acquire`
    pub waiting: usize,
}

impl PoolStatus {
    /// Fraction of the capacity in use, from 0.0 to 1.0
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.active as f64 / self.total as f64
        }
    }

    /// Whether every slot is in use
    pub fn is_exhausted(&self) -> bool {
        self.available == 0
    }
}

/// State of a single slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    /// Slot id
    pub id: SlotHandle,

    /// Whether the slot is acquired
    pub in_use: bool,

    /// Last acquire, release or execute on this slot
    pub last_used: DateTime<Utc>,
}
