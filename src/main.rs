//! Open Markings main entry point
//!
//! This is the command-line interface for discovering and scraping WRRC
//! open-markings result pages.

use anyhow::{bail, Context};
use clap::Parser;
use open_markings::config::{load_config_with_hash, validate, Config};
use open_markings::harvest::{run_harvest, scrape_urls, year_windows};
use open_markings::output::print_summary;
use open_markings::Filter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Open Markings: discover and extract WRRC competition results
///
/// Probes the results site for competitions and rounds in the requested years,
/// parses the judges' open markings and writes one JSON file per accepted round.
#[derive(Parser, Debug)]
#[command(name = "open-markings")]
#[command(version)]
#[command(about = "Discover and extract WRRC open-markings results", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Year or year range to discover, e.g. 2025 or 2019-2025
    #[arg(short, long)]
    years: Option<String>,

    /// Dance filter, full name or alias (e.g. "Boogie Woogie", BW)
    #[arg(long)]
    dance: Option<String>,

    /// Class filter (e.g. "Main Class")
    #[arg(long = "class")]
    class_name: Option<String>,

    /// Round filter (e.g. Final)
    #[arg(long)]
    round: Option<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<u32>,

    /// Directory for the JSON results
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Emit separate slow and fast records for slow/fast rounds
    #[arg(long)]
    split_heats: bool,

    /// Scrape a single round URL instead of discovering
    #[arg(long, conflicts_with_all = ["urls_file", "dry_run"])]
    url: Option<String>,

    /// Scrape the round URLs listed in a file, one per line
    #[arg(long, value_name = "FILE", conflicts_with = "dry_run")]
    urls_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be probed without any network traffic
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.url.is_some() || cli.urls_file.is_some() {
        let urls = collect_urls(cli.url.as_deref(), cli.urls_file.as_deref())?;
        handle_scrape(&config, &urls).await
    } else {
        handle_discovery(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("open_markings=info,warn"),
            1 => EnvFilter::new("open_markings=debug,info"),
            2 => EnvFilter::new("open_markings=trace,debug"),
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

/// Loads the configuration file if given, applies the command-line overrides
/// and validates the result
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file, using defaults");
            Config::default()
        }
    };

    if let Some(years) = &cli.years {
        config.filter.years = Some(years.clone());
    }
    if let Some(dance) = &cli.dance {
        config.filter.dance = Some(dance.clone());
    }
    if let Some(class_name) = &cli.class_name {
        config.filter.class_name = Some(class_name.clone());
    }
    if let Some(round) = &cli.round {
        config.filter.round = Some(round.clone());
    }
    if let Some(workers) = cli.workers {
        config.scraper.workers = workers;
    }
    if let Some(output) = &cli.output {
        config.output.results_dir = output.to_string_lossy().into_owned();
    }
    if cli.split_heats {
        config.filter.split_heats = true;
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Gathers explicit URLs from `--url` and `--urls-file`
fn collect_urls(url: Option<&str>, urls_file: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let mut urls = Vec::new();
    if let Some(url) = url {
        urls.push(url.trim().to_string());
    }

    if let Some(path) = urls_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        urls.extend(parse_url_list(&content));
    }

    if urls.is_empty() {
        bail!("no URLs to scrape");
    }
    Ok(urls)
}

/// One URL per line; blank lines and `#` comments are skipped
fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Handles the --dry-run mode: validates config and shows what would be probed
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let filter = Filter::from_config(&config.filter).context("invalid filter")?;
    let windows = year_windows(config, &filter);

    println!("=== Open Markings Dry Run ===\n");

    println!("Filter:");
    println!("  {}", filter);
    println!("  Split heats: {}", config.filter.split_heats);

    println!("\nScraper:");
    println!("  Workers: {}", config.scraper.workers);
    println!("  Request delay: {}ms", config.scraper.request_delay_ms);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.scraper.timeout_secs, config.scraper.connect_timeout_secs
    );
    println!(
        "  Retries: {} (backoff {}ms)",
        config.scraper.max_retries, config.scraper.retry_backoff_ms
    );
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nDiscovery:");
    println!("  Base URL: {}", config.discovery.base_url);
    println!(
        "  Rounds: {}..={} (gap tolerance {})",
        config.discovery.first_round,
        config.discovery.last_round,
        config.discovery.round_gap_tolerance
    );
    println!(
        "  Competition gap tolerance: {}",
        config.discovery.competition_gap_tolerance
    );

    println!("\nWindows ({}):", windows.len());
    for (year, window) in &windows {
        println!(
            "  - {}: {:04}..={:04} ({} IDs)",
            year,
            window.first,
            window.last,
            window.size()
        );
    }

    let competitions: u64 = windows.iter().map(|(_, window)| window.size()).sum();
    let rounds = u64::from(
        config
            .discovery
            .last_round
            .saturating_sub(config.discovery.first_round),
    ) + 1;

    println!("\nOutput:");
    println!("  Results directory: {}", config.output.results_dir);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would probe at most {} competitions and {} round pages",
        competitions,
        competitions.saturating_mul(rounds)
    );

    Ok(())
}

/// Handles explicit URL scraping
async fn handle_scrape(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    tracing::info!("Scraping {} URLs", urls.len());

    let outcomes = scrape_urls(config, urls).await?;

    println!("=== Scrape Summary ===\n");
    for outcome in &outcomes {
        match &outcome.error {
            None => println!("  ✓ {} ({} files)", outcome.url, outcome.written.len()),
            Some(error) => println!("  ✗ {}: {}", outcome.url, error),
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    println!(
        "\n{} succeeded, {} failed",
        outcomes.len() - failed,
        failed
    );

    if failed == outcomes.len() {
        bail!("every URL failed");
    }
    Ok(())
}

/// Handles the main discovery run
async fn handle_discovery(config: &Config) -> anyhow::Result<()> {
    let filter = Filter::from_config(&config.filter)
        .context("a year or year range is required (--years or [filter] years)")?;

    tracing::info!("Filter: {}", filter);

    match run_harvest(config, filter).await {
        Ok(summary) => {
            tracing::info!("Discovery completed successfully");
            print_summary(&summary, 20);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Discovery failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list() {
        let content = "\n# 2025 finals\nhttps://www.wrrc.org/results/2025-3459/ocj_2010.htm\n  \n  https://www.wrrc.org/results/2025-3459/ocj_2011.htm  \n";
        assert_eq!(
            parse_url_list(content),
            vec![
                "https://www.wrrc.org/results/2025-3459/ocj_2010.htm",
                "https://www.wrrc.org/results/2025-3459/ocj_2011.htm",
            ]
        );
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "open-markings",
            "--years",
            "2024-2025",
            "--dance",
            "BW",
            "--workers",
            "4",
            "--split-heats",
        ]);
        let config = load(&cli).unwrap();

        assert_eq!(config.filter.years.as_deref(), Some("2024-2025"));
        assert_eq!(config.filter.dance.as_deref(), Some("BW"));
        assert_eq!(config.scraper.workers, 4);
        assert!(config.filter.split_heats);
    }

    #[test]
    fn test_collect_urls_requires_one() {
        assert!(collect_urls(None, None).is_err());
        assert_eq!(collect_urls(Some(" http://a/ "), None).unwrap(), vec!["http://a/"]);
    }
}
