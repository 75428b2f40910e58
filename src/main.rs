//! Carfeed main entry point
//!
//! This is the command-line interface for the Carfeed vehicle-listing pipeline.

use anyhow::Context;
use carfeed::config::{load_config_with_hash, Config};
use carfeed::pipeline::{Pipeline, Stage};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Carfeed: a vehicle-listing harvester
///
/// Carfeed crawls a marketplace's search results, extracts structured records from the
/// listing pages, normalizes them and delivers them to an ingestion endpoint. Each
/// invocation performs one run; schedule it externally for periodic harvesting.
#[derive(Parser, Debug)]
#[command(name = "carfeed")]
#[command(version)]
#[command(about = "A vehicle-listing harvester", long_about = None)]
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

    /// Run a single stage instead of the whole pipeline
    #[arg(long, value_enum, conflicts_with_all = ["dry_run", "stats"])]
    stage: Option<Stage>,

    /// Validate config and show what would run without running it
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the ledger and database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_run(config, config_hash, cli.stage).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("carfeed=info,warn"),
            1 => EnvFilter::new("carfeed=debug,info"),
            2 => EnvFilter::new("carfeed=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &Config) {
    println!("=== Carfeed Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    match config.crawler.resolved_base_url() {
        Ok(base) => println!("  Base URL: {}", base),
        Err(e) => println!("  Base URL: unresolved ({})", e),
    }
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max new records: {}", config.crawler.max_new_records);
    println!("  Max images per record: {}", config.crawler.max_images);
    println!(
        "  Cooldown: {}s every {} records",
        config.rate_limit.cooldown_secs, config.rate_limit.batch_size
    );

    println!("\nRenderer:");
    println!("  User agent: {}", config.renderer.user_agent);
    println!("  Request timeout: {}s", config.renderer.request_timeout_secs);

    println!("\nStorage:");
    println!("  Ledger: {}", config.storage.ledger_path);
    println!("  Database: {}", config.storage.database_path);

    println!("\nNormalization:");
    println!("  Source tag: {}", config.normalize.source);
    println!(
        "  Price range: {} - {}",
        config.normalize.min_price, config.normalize.max_price
    );
    println!("  Earliest year: {}", config.normalize.min_year);
    println!("  Fallback fuel: {}", config.normalize.fallback_fuel);
    if config.normalize.brands.is_empty() {
        println!("  Brands: built-in table");
    } else {
        println!("  Brands: {} configured", config.normalize.brands.len());
    }

    println!("\nSync:");
    println!("  Endpoint: {}", config.sync.endpoint);
    println!("  Summary endpoint: {}", config.sync.summary_endpoint);
    println!(
        "  Inter-request delay: {}ms",
        config.sync.inter_request_delay_ms
    );

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl up to {} pages for at most {} new records",
        config.crawler.max_pages, config.crawler.max_new_records
    );
}

/// Handles the --stats mode: shows statistics from the ledger and database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use carfeed::output::{load_statistics, print_statistics};
    use carfeed::storage::{open_store, Ledger};

    println!("Ledger: {}", config.storage.ledger_path);
    println!("Database: {}\n", config.storage.database_path);

    let ledger = Ledger::load(&config.storage.ledger_path);
    let store = open_store(Path::new(&config.storage.database_path))
        .context("failed to open database")?;

    let stats = load_statistics(&ledger, &store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles a pipeline run, whole or single-stage
async fn handle_run(
    config: Config,
    config_hash: String,
    stage: Option<Stage>,
) -> anyhow::Result<()> {
    let stages = match stage {
        Some(stage) => {
            tracing::info!("Running the {} stage only", stage);
            vec![stage]
        }
        None => Stage::ALL.to_vec(),
    };

    let mut pipeline = Pipeline::new(config, config_hash)?;
    let report = pipeline.run_stages(&stages).await;

    if report.is_success() {
        tracing::info!("Run completed successfully");
        Ok(())
    } else {
        anyhow::bail!(
            "run failed: {}",
            report.error.unwrap_or_else(|| "unknown error".to_string())
        )
    }
}
