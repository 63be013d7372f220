//! Demo command
//!
//! Walks a pool through a typical session: a repeated initialize, a single
//! acquire/query/release cycle, then several slots held at once.

use anyhow::Result;
use slotpool_core::{InitOutcome, PoolConfig, ResourcePool};

fn print_status(label: &str, pool: &ResourcePool) -> Result<()> {
    println!("{}: {}", label, serde_json::to_string(&pool.status()?)?);
    Ok(())
}

/// Implementation of the demo command
pub fn execute_demo(pool: &ResourcePool) -> Result<()> {
    println!("=== Resource Pool Demo ===");
    let config = pool.config()?;
    println!("Pool target: {}", config.connection_url());

    let retry = PoolConfig::new(config.max_connections).with_host("another.example.com");
    if pool.initialize(retry)? == InitOutcome::AlreadyInitialized {
        println!("Second initialize ignored, target is still {}", pool.config()?.connection_url());
    }

    println!("\n=== Single Slot ===");
    let handle = pool.try_acquire()?;
    print_status("Pool status after acquiring a slot", pool)?;
    pool.execute_query(handle, "SELECT * FROM users")?;
    pool.release(handle)?;
    print_status("Pool status after releasing the slot", pool)?;

    println!("\n=== Multiple Slots ===");
    let wanted = config.max_connections.min(3);
    let handles = (0..wanted)
        .map(|_| pool.try_acquire())
        .collect::<Result<Vec<_>, _>>()?;
    print_status("Pool status with multiple slots", pool)?;

    for handle in handles {
        pool.release(handle)?;
    }
    print_status("Pool status after releasing all", pool)?;

    Ok(())
}
