use anyhow::Result;
use clap::{Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::sync::Arc;

mod bootstrap;
mod commands;

use bootstrap::PoolOptions;
use commands::query::QueryArgs;
use commands::stress::StressArgs;

/// Slotpool Command Line Interface
///
/// Builds one resource pool from the configuration and drives it.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to a TOML pool configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the number of slots
    #[arg(long, global = true)]
    max_connections: Option<usize>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print pool status and per-slot state
    Status,

    /// Walk through a typical acquire/query/release session
    Demo,

    /// Run a query on a pooled slot
    Query(QueryArgs),

    /// Hammer the pool from many threads
    Stress(StressArgs),
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let options = PoolOptions {
        config_path: cli.config.as_deref(),
        max_connections: cli.max_connections,
    };
    let pool = bootstrap::initialize_pool(&options)?;

    match cli.command {
        Commands::Status => commands::status::execute_status(&pool),
        Commands::Demo => commands::demo::execute_demo(&pool),
        Commands::Query(args) => commands::query::execute_query(&pool, &args),
        Commands::Stress(args) => commands::stress::execute_stress(Arc::new(pool), &args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
