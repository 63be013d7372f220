//! Query command

use anyhow::Result;
use clap::Args;
use slotpool_core::{ResourcePool, WaitPolicy};
use std::time::Duration;

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query text to run
    #[arg(long)]
    pub sql: String,

    /// How long to wait for a free slot, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
}

/// Implementation of the query command
pub fn execute_query(pool: &ResourcePool, args: &QueryArgs) -> Result<()> {
    let guard = pool.checkout(WaitPolicy::block_for(Duration::from_millis(args.timeout_ms)))?;
    let handle = guard.handle();

    pool.execute_query(handle, &args.sql)?;
    println!("Executed on slot {}: {}", handle, args.sql);

    guard.release()?;
    Ok(())
}
