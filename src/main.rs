//! Treeline main entry point
//!
//! This is the command-line interface for the Treeline forum archiver.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use treeline::config::load_config_with_hash;
use treeline::crawler::{run_next, Fetcher};
use treeline::storage::{open_storage, Storage};

/// Treeline: an incremental forum archiver
///
/// Treeline archives a story-and-comments forum one small step at a time.
/// By default it serves the trigger endpoint and waits for an external
/// recurring caller; `--step` runs a single scheduler step directly, for
/// use under cron.
#[derive(Parser, Debug)]
#[command(name = "treeline")]
#[command(version = "1.0.0")]
#[command(about = "An incremental forum archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run exactly one scheduler step and exit
    #[arg(long, conflicts_with = "stats")]
    step: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "step")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.step {
        handle_step(&config).await?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_serve(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("treeline=info,warn"),
            1 => EnvFilter::new("treeline=debug,info"),
            2 => EnvFilter::new("treeline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --step mode: runs one scheduler step directly
async fn handle_step(config: &treeline::Config) -> anyhow::Result<()> {
    let mut storage = open_storage(Path::new(&config.archive.database_path))?;
    let fetcher = Fetcher::new(&config.site, &config.client)?;

    let step = run_next(&mut storage, &fetcher).await?;
    println!("Ran step: {:?}", step);

    Ok(())
}

/// Handles the --stats mode: shows archive statistics
fn handle_stats(config: &treeline::Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.archive.database_path);

    let storage = open_storage(Path::new(&config.archive.database_path))?;

    let coverage = storage.coverage_state()?;
    println!("Archived items:   {}", storage.count_items()?);
    println!("Pending queue:    {}", storage.count_pending()?);
    println!("Raw pages logged: {}", storage.count_raw_pages()?);
    println!("Scan cursor:      {}", coverage.low_bound);
    println!("Upper bound:      {}", coverage.upper_bound);
    println!("Records archived: {}", coverage.processed_count);

    Ok(())
}

/// Handles the default mode: serve the trigger endpoint
async fn handle_serve(config: &treeline::Config) -> anyhow::Result<()> {
    tracing::info!(
        "Archiving {} into {}",
        config.site.base_url,
        config.archive.database_path
    );

    match treeline::server::serve(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Trigger server failed: {}", e);
            Err(e.into())
        }
    }
}
