//! Harvest coordinator - run orchestration
//!
//! This module wires the engine together for the two kinds of run:
//! - discovery, which probes the identifier space and streams accepted records
//! - direct scraping of explicit round URLs
//!
//! Both write through the same [`JsonWriter`].

use crate::config::{Config, IdWindow};
use crate::harvest::discoverer::{
    load_event, load_round, CompetitionProber, ProbeSettings, RoundOutcome,
};
use crate::harvest::fetcher::HttpFetcher;
use crate::harvest::pacer::PacedSource;
use crate::harvest::parser::HeatSelection;
use crate::harvest::scheduler::{PoolSettings, Scheduler};
use crate::harvest::source::PageSource;
use crate::model::{CompetitionRecord, Filter};
use crate::output::{JsonWriter, RunSummary, TaskError};
use crate::url::CompetitionUrls;
use crate::{HarvestError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

/// A running discovery
///
/// Records arrive through [`Discovery::next`] as soon as the competitions
/// before them have resolved. [`Discovery::finish`] waits for the run and
/// returns its summary.
pub struct Discovery {
    records: mpsc::Receiver<CompetitionRecord>,
    handle: JoinHandle<RunSummary>,
}

impl Discovery {
    /// Next accepted record, or `None` once discovery is done
    pub async fn next(&mut self) -> Option<CompetitionRecord> {
        self.records.recv().await
    }

    /// Waits for the run to end; records not taken yet are dropped
    pub async fn finish(self) -> Result<RunSummary> {
        let Self { records, handle } = self;
        drop(records);
        handle
            .await
            .map_err(|e| HarvestError::Worker(format!("scheduler failed: {}", e)))
    }
}

/// Competition ID window of every year in the filter
pub fn year_windows(config: &Config, filter: &Filter) -> Vec<(i32, IdWindow)> {
    filter
        .years
        .years()
        .map(|year| (year, config.discovery.window_for(year)))
        .collect()
}

/// Starts discovery over the years of `filter`
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `filter` - Years to probe and the predicates records must pass
/// * `source` - Where pages come from
///
/// # Returns
///
/// * `Ok(Discovery)` - The running discovery
/// * `Err(HarvestError)` - The configuration cannot be used
pub fn discover(
    config: &Config,
    filter: Filter,
    source: Arc<dyn PageSource>,
) -> Result<Discovery> {
    let settings = ProbeSettings::from_config(config)?;
    let windows = year_windows(config, &filter);

    tracing::info!(
        "Discovering {} in {} under {}",
        filter,
        filter.years,
        settings.base_url
    );

    let pool = PoolSettings {
        workers: config.scraper.workers as usize,
        request_delay: Duration::from_millis(config.scraper.request_delay_ms),
        competition_gap_tolerance: config.discovery.competition_gap_tolerance,
    };

    let scheduler = Scheduler::new(CompetitionProber::new(settings, filter), source, pool, windows);

    let (tx, rx) = mpsc::channel(64);
    let handle = tokio::spawn(scheduler.run(tx));

    Ok(Discovery {
        records: rx,
        handle,
    })
}

/// Runs a complete discovery against the live site and writes every accepted
/// record
///
/// This is the main entry point for a discovery run. It will:
/// 1. Build the HTTP client
/// 2. Create the results directory
/// 3. Probe competitions and rounds across the worker pool
/// 4. Write accepted records as they are committed
pub async fn run_harvest(config: &Config, filter: Filter) -> Result<RunSummary> {
    let fetcher: Arc<dyn PageSource> = Arc::new(HttpFetcher::new(config)?);
    let writer = JsonWriter::new(&config.output.results_dir)?;
    harvest_into(config, filter, fetcher, &writer).await
}

/// Discovery from any page source into a writer
pub async fn harvest_into(
    config: &Config,
    filter: Filter,
    source: Arc<dyn PageSource>,
    writer: &JsonWriter,
) -> Result<RunSummary> {
    let mut discovery = discover(config, filter, source)?;
    let mut written = 0;
    let mut write_errors = Vec::new();

    while let Some(record) = discovery.next().await {
        match writer.write(&record) {
            Ok(path) => {
                tracing::info!("Saved {} to {}", record.describe(), path.display());
                written += 1;
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", record.describe(), e);
                write_errors.push(TaskError::new("", e.to_string()));
            }
        }
    }

    let mut summary = discovery.finish().await?;
    summary.written = written;
    summary.errors.extend(write_errors);
    Ok(summary)
}

/// Result of scraping one explicit URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOutcome {
    pub url: String,

    /// Files written for this URL
    pub written: Vec<PathBuf>,

    pub error: Option<String>,
}

impl UrlOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Scrapes explicit round URLs without filtering
pub async fn scrape_urls(config: &Config, urls: &[String]) -> Result<Vec<UrlOutcome>> {
    let fetcher: Arc<dyn PageSource> = Arc::new(HttpFetcher::new(config)?);
    let writer = JsonWriter::new(&config.output.results_dir)?;
    Ok(scrape_into(config, urls, fetcher, &writer).await)
}

/// Scrapes explicit round URLs from any page source into a writer
///
/// URLs are processed one after another with the configured request delay.
pub async fn scrape_into(
    config: &Config,
    urls: &[String],
    source: Arc<dyn PageSource>,
    writer: &JsonWriter,
) -> Vec<UrlOutcome> {
    let source = PacedSource::new(source, Duration::from_millis(config.scraper.request_delay_ms));
    let heats = HeatSelection::from_split_flag(config.filter.split_heats);
    let start_time = Instant::now();

    let mut outcomes = Vec::with_capacity(urls.len());
    for url in urls {
        let outcome = match scrape_one(&source, url, heats, writer).await {
            Ok(written) => UrlOutcome {
                url: url.clone(),
                written,
                error: None,
            },
            Err(e) => {
                tracing::warn!("{}: {}", url, e);
                UrlOutcome {
                    url: url.clone(),
                    written: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    tracing::info!(
        "Scraped {}/{} URLs in {:.1}s",
        succeeded,
        outcomes.len(),
        start_time.elapsed().as_secs_f64()
    );
    outcomes
}

async fn scrape_one(
    source: &dyn PageSource,
    url: &str,
    heats: HeatSelection,
    writer: &JsonWriter,
) -> Result<Vec<PathBuf>> {
    let markings_url = Url::parse(url.trim())?;
    let (urls, round_number) = CompetitionUrls::from_markings_url(&markings_url)?;

    let event = load_event(source, &urls)
        .await?
        .ok_or_else(|| HarvestError::NotFound {
            url: urls.event_header().map_or_else(|_| url.to_string(), |u| u.to_string()),
        })?;

    let records = match load_round(source, &urls, round_number, &event, heats).await {
        RoundOutcome::NotFound => {
            return Err(HarvestError::NotFound {
                url: markings_url.to_string(),
            })
        }
        RoundOutcome::Failed(error) => return Err(error),
        RoundOutcome::Found(records) => records?,
    };

    let mut written = Vec::with_capacity(records.len());
    for record in &records {
        let path = writer.write(record)?;
        tracing::info!("Saved {} to {}", record.describe(), path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::source::memory::MemorySource;
    use crate::model::YearRange;
    use std::fs;
    use tempfile::TempDir;

    const NASLOV: &str = include_str!("../../tests/fixtures/naslov.htm");
    const PANEL: &str = include_str!("../../tests/fixtures/turnir_naslov.htm");
    const MARKINGS: &str = include_str!("../../tests/fixtures/ocj_2010.htm");
    const SLOW_FAST: &str = include_str!("../../tests/fixtures/ocj_slow_fast.htm");
    const NAMES: &str = include_str!("../../tests/fixtures/rez_2010.htm");

    const ROOT: &str = "http://results.test/2025-3459/";

    fn page(name: &str) -> String {
        format!("{}{}", ROOT, name)
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.discovery.base_url = "http://results.test/".to_string();
        config.discovery.first_round = 2008;
        config.discovery.last_round = 2020;
        config.discovery.round_gap_tolerance = 3;
        config.discovery.competition_gap_tolerance = 2;
        config.discovery.windows = vec![crate::config::YearWindow {
            year: 2025,
            first: 3459,
            last: 3460,
        }];
        config.scraper.workers = 2;
        config.scraper.request_delay_ms = 0;
        config
    }

    fn source() -> Arc<MemorySource> {
        Arc::new(
            MemorySource::new()
                .with_page(&page("naslov.htm"), NASLOV)
                .with_page(&page("turnir_naslov.htm"), PANEL)
                .with_page(&page("ocj_2010.htm"), MARKINGS)
                .with_page(&page("rez_2010.htm"), NAMES),
        )
    }

    fn slow_fast_source() -> Arc<MemorySource> {
        Arc::new(
            MemorySource::new()
                .with_page(&page("naslov.htm"), NASLOV)
                .with_page(&page("turnir_naslov.htm"), PANEL)
                .with_page(&page("ocj_2012.htm"), SLOW_FAST),
        )
    }

    #[test]
    fn test_year_windows() {
        let config = config();
        let filter = Filter::new(YearRange::new(2024, 2025).unwrap());
        let windows = year_windows(&config, &filter);

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0], (2024, config.discovery.default_window));
        assert_eq!(windows[1].1.first, 3459);
    }

    #[tokio::test]
    async fn test_harvest_writes_accepted_records() {
        let dir = TempDir::new().unwrap();
        let writer = JsonWriter::new(dir.path()).unwrap();
        let filter = Filter::new(YearRange::single(2025)).with_dance("BW");

        let summary = harvest_into(&config(), filter, source(), &writer)
            .await
            .unwrap();

        assert_eq!(summary.competitions_probed, 2);
        assert_eq!(summary.rounds_found, 1);
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.written, 1);

        let path = dir
            .path()
            .join("results_Geneve_06-09-25_Boogie-Woogie_Main-Class_Final.json");
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("Tom MEIER & Lea KELLER"));
    }

    #[tokio::test]
    async fn test_discovery_streams_records() {
        let filter = Filter::new(YearRange::single(2025)).with_round("Final");
        let mut discovery = discover(&config(), filter, source()).unwrap();

        let mut rounds = Vec::new();
        while let Some(record) = discovery.next().await {
            rounds.push(record.competition_info.round.clone());
        }
        let summary = discovery.finish().await.unwrap();

        assert!(rounds.iter().all(|round| round == "Final"));
        assert_eq!(summary.accepted as usize, rounds.len());
    }

    #[tokio::test]
    async fn test_scrape_reports_each_url() {
        let dir = TempDir::new().unwrap();
        let writer = JsonWriter::new(dir.path()).unwrap();
        let urls = vec![
            page("ocj_2010.htm"),
            page("ocj_2011.htm"),
            "http://results.test/about.htm".to_string(),
        ];

        let outcomes = scrape_into(&config(), &urls, source(), &writer).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[0].written.len(), 1);
        assert!(outcomes[1].error.as_deref().unwrap().contains("not found"));
        assert!(outcomes[2].error.is_some());
    }

    #[tokio::test]
    async fn test_scrape_splits_heats() {
        let dir = TempDir::new().unwrap();
        let writer = JsonWriter::new(dir.path()).unwrap();
        let mut config = config();
        config.filter.split_heats = true;

        let outcomes =
            scrape_into(&config, &[page("ocj_2012.htm")], slow_fast_source(), &writer).await;

        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[0].written.len(), 2);
        assert!(outcomes[0].written[0].to_string_lossy().ends_with("_Slow.json"));
        assert!(outcomes[0].written[1].to_string_lossy().ends_with("_Fast.json"));
    }
}
