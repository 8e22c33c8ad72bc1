//! Harvest engine for discovering and extracting competition results
//!
//! This module contains the core engine, including:
//! - Page sources: the HTTP fetcher with retry logic and per-worker pacing
//! - Parsing of the markings, judge panel, event header and name pages
//! - Classification of records against the run's filter
//! - Identifier space discovery with gap tolerance
//! - The parallel scheduler and overall run coordination

mod classifier;
mod coordinator;
mod cursor;
mod discoverer;
mod fetcher;
mod pacer;
pub mod parser;
mod scheduler;
mod source;

pub use classifier::accept;
pub use coordinator::{
    discover, harvest_into, run_harvest, scrape_into, scrape_urls, year_windows, Discovery,
    UrlOutcome,
};
pub use cursor::YearCursor;
pub use discoverer::{
    load_event, load_round, CompetitionProber, CompetitionReport, ProbeSettings, RoundOutcome,
};
pub use fetcher::{build_http_client, HttpFetcher};
pub use pacer::{PacedSource, Pacer};
pub use parser::{parse_round, EventContext, HeatSelection, RoundPages};
pub use scheduler::{PoolSettings, Scheduler, WorkQueue};
pub use source::{FetchOutcome, PageSource};
