//! Fanout main entry point
//!
//! This is the command-line interface for the fanout crawler.

use anyhow::Context;
use clap::Parser;
use fanout_crawler::config::{load_config_with_hash, validate, Config};
use fanout_crawler::crawler::crawl;
use fanout_crawler::output::print_report;
use fanout_crawler::url::LinkMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Fanout: a depth-bounded concurrent web crawler
///
/// Starting from SEED, fetches every page reachable within the depth budget,
/// visiting each URL at most once, and prints what it found.
#[derive(Parser, Debug)]
#[command(name = "fanout-crawler")]
#[command(version)]
#[command(about = "A depth-bounded concurrent web crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Maximum link hops from the seed, counting the seed itself (overrides config)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum fetches in flight at once, 0 for unbounded (overrides config)
    #[arg(long, value_name = "N")]
    max_concurrent: Option<u32>,

    /// How links are canonicalized: "full" or "origin" (overrides config)
    #[arg(long, value_name = "MODE")]
    link_mode: Option<LinkMode>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration after applying command-line flags")?;

    if cli.dry_run {
        print_dry_run(&config, &cli.seed);
        return Ok(());
    }

    let report = crawl(&config, &cli.seed)
        .await
        .with_context(|| format!("crawl of {} failed", cli.seed))?;

    if !cli.quiet {
        print_report(&report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fanout_crawler=info,warn"),
            1 => EnvFilter::new("fanout_crawler=debug,info"),
            2 => EnvFilter::new("fanout_crawler=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(limit) = cli.max_concurrent {
        config.crawler.max_concurrent_fetches = limit;
    }
    if let Some(mode) = cli.link_mode {
        config.crawler.link_mode = mode;
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn print_dry_run(config: &Config, seed: &str) {
    println!("=== Fanout Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    match config.crawler.max_concurrent_fetches {
        0 => println!("  Max concurrent fetches: unbounded"),
        n => println!("  Max concurrent fetches: {}", n),
    }
    println!("  Link mode: {}", config.crawler.link_mode);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  Max redirects: {}", config.http.max_redirects);

    println!("\n✓ Configuration is valid");
}
