//! Stress command
//!
//! Spawns worker threads that compete for the pool and reports how many got
//! a slot, how many timed out and the highest occupancy observed.

use anyhow::{bail, Result};
use clap::Args;
use log::debug;
use serde::Serialize;
use slotpool_core::{PoolError, ResourcePool, WaitPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Arguments for the stress command
#[derive(Args, Debug)]
pub struct StressArgs {
    /// Number of concurrent workers
    #[arg(long, default_value_t = 50)]
    pub workers: usize,

    /// How long each worker holds its slot, in milliseconds
    #[arg(long, default_value_t = 10)]
    pub hold_ms: u64,

    /// How long each worker waits for a slot, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,
}

/// Outcome of a stress run
#[derive(Debug, Default, Serialize)]
pub struct StressReport {
    /// Workers that got a slot
    pub granted: usize,

    /// Workers whose wait expired
    pub timed_out: usize,

    /// Most workers holding a slot at the same time
    pub peak_active: usize,

    /// Pool capacity
    pub capacity: usize,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u128,
}

/// Implementation of the stress command
pub fn execute_stress(pool: Arc<ResourcePool>, args: &StressArgs) -> Result<()> {
    let capacity = pool.status()?.total;
    let barrier = Arc::new(Barrier::new(args.workers.max(1)));
    let in_use = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let policy = WaitPolicy::block_for(Duration::from_millis(args.timeout_ms));
    let hold = Duration::from_millis(args.hold_ms);
    let started = Instant::now();

    let workers: Vec<_> = (0..args.workers)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            let in_use = Arc::clone(&in_use);
            let peak = Arc::clone(&peak);
            thread::spawn(move || -> Result<bool, PoolError> {
                barrier.wait();
                let guard = match pool.checkout(policy) {
                    Ok(guard) => guard,
                    Err(e) if e.is_exhausted() => {
                        debug!("Worker {} gave up: {}", worker, e);
                        return Ok(false);
                    }
                    Err(e) => return Err(e),
                };

                let holders = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(holders, Ordering::SeqCst);
                let outcome = guard.execute(|_| thread::sleep(hold));
                in_use.fetch_sub(1, Ordering::SeqCst);

                outcome?;
                guard.release()?;
                Ok(true)
            })
        })
        .collect();

    let mut report = StressReport {
        capacity,
        ..StressReport::default()
    };
    for worker in workers {
        let granted = match worker.join() {
            Ok(outcome) => outcome?,
            Err(_) => bail!("stress worker panicked"),
        };
        if granted {
            report.granted += 1;
        } else {
            report.timed_out += 1;
        }
    }
    report.peak_active = peak.load(Ordering::SeqCst);
    report.elapsed_ms = started.elapsed().as_millis();

    println!("granted: {}", report.granted);
    println!("timed_out: {}", report.timed_out);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.peak_active > report.capacity {
        bail!(
            "peak occupancy {} exceeded capacity {}",
            report.peak_active,
            report.capacity
        );
    }

    Ok(())
}
