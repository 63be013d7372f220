//! Status command
//!
//! Prints the connection target, occupancy and per-slot state as JSON.

use anyhow::Result;
use serde_json::json;
use slotpool_core::ResourcePool;

/// Implementation of the status command
pub fn execute_status(pool: &ResourcePool) -> Result<()> {
    let config = pool.config()?;
    let report = json!({
        "target": config.connection_url(),
        "status": pool.status()?,
        "slots": pool.slots()?,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
