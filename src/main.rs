//! Stockwatch main entry point
//!
//! This is the command-line interface for the Stockwatch catalog stock tracker.

use anyhow::Context;
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use stockwatch::config::{load_config_with_hash, Config};
use stockwatch::document::{HtmlBrowser, HttpSource};
use stockwatch::output::{print_statistics, write_stock_report, RunStatistics};
use stockwatch::{ScrapeOrchestrator, StartMode};
use tracing_subscriber::EnvFilter;

/// Stockwatch: a catalog stock tracker
///
/// Stockwatch walks the listing pages of a product catalog, resolves every
/// product's variants, and reports which items are in stock, partially out of
/// stock, or out of stock. Interrupted runs resume from their checkpoint.
#[derive(Parser, Debug)]
#[command(name = "stockwatch")]
#[command(version = "1.0.0")]
#[command(about = "A catalog stock tracker", long_about = None)]
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

    /// Resume from existing checkpoints without asking
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Discard existing checkpoints and start over
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long)]
    dry_run: bool,
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
        return Ok(());
    }

    handle_scrape(config, cli.resume, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("stockwatch=info,warn"),
            1 => EnvFilter::new("stockwatch=debug,info"),
            2 => EnvFilter::new("stockwatch=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated plan
fn handle_dry_run(config: &Config) {
    println!("=== Stockwatch Dry Run ===\n");

    println!("Catalog:");
    println!("  Name: {}", config.catalog.display_name());
    println!("  Family: {}", config.catalog.family);

    println!("\nCategories ({}):", config.catalog.categories.len());
    for category in &config.catalog.categories {
        println!(
            "  - {} [{}]: {}",
            category.badge, category.stock_status, category.url
        );
    }

    println!("\nScraper:");
    println!("  Max attempts: {}", config.scraper.max_attempts);
    println!(
        "  Throttle: {}ms + up to {}ms jitter",
        config.scraper.throttle_delay_ms, config.scraper.throttle_jitter_ms
    );
    if config.testing.enabled {
        println!(
            "  Testing mode: {} items per page, {} pages",
            config.testing.items_per_page, config.testing.max_pages
        );
    }

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Results: {}", config.output.results_path);
    println!("  Report: {}", config.output.report_path);

    println!("\n✓ Configuration is valid");
}

/// Asks the operator whether to resume; anything but "y" starts fresh
fn prompt_resume() -> anyhow::Result<bool> {
    print!("A checkpoint exists. Resume from it? [Y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config, resume: bool, fresh: bool) -> anyhow::Result<()> {
    let source = HttpSource::from_config(&config.browser).context("failed to build HTTP client")?;
    let report_path = config.output.report_path.clone();
    let catalog_name = config.catalog.display_name().to_string();

    let mut orchestrator = ScrapeOrchestrator::new(HtmlBrowser::new(source), config);

    let mode = if fresh {
        StartMode::Fresh
    } else if resume || !orchestrator.has_checkpoint() {
        StartMode::Resume
    } else if prompt_resume()? {
        StartMode::Resume
    } else {
        StartMode::Fresh
    };

    let items = match orchestrator.run(mode).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            tracing::error!("Checkpoint preserved; run again with --resume to continue");
            return Err(e.into());
        }
    };

    print_statistics(&RunStatistics::from_items(&items));

    write_stock_report(&catalog_name, &items, Path::new(&report_path))
        .with_context(|| format!("failed to write report to {}", report_path))?;
    println!("\n✓ Report written to: {}", report_path);

    Ok(())
}
