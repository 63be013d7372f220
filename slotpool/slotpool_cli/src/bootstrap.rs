//! Pool construction for the CLI
//!
//! Loads the configuration, applies command-line overrides and creates the
//! single pool instance every command works on.

use anyhow::{Context, Result};
use log::info;
use slotpool_core::{PoolConfig, ResourcePool};
use std::path::Path;

/// Options that shape the pool, collected from the global flags
#[derive(Debug, Default, Clone)]
pub struct PoolOptions<'a> {
    /// TOML configuration file
    pub config_path: Option<&'a Path>,

    /// Capacity override
    pub max_connections: Option<usize>,
}

/// Resolve the configuration for this run
pub fn resolve_config(options: &PoolOptions<'_>) -> Result<PoolConfig> {
    let mut config = match options.config_path {
        Some(path) => {
            info!("Loading pool configuration from {}", path.display());
            PoolConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => {
            info!("No configuration file specified, using defaults");
            PoolConfig::default()
        }
    };

    if let Some(max_connections) = options.max_connections {
        config.max_connections = max_connections;
    }

    Ok(config)
}

/// Build and initialize the pool
pub fn initialize_pool(options: &PoolOptions<'_>) -> Result<ResourcePool> {
    let config = resolve_config(options)?;
    ResourcePool::with_config(config).context("Failed to initialize resource pool")
}
