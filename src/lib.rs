//! Open Markings: a polite scraper for WRRC open-markings result pages
//!
//! This crate discovers competition result pages on the WRRC results site by probing
//! its identifier space, parses the judges' open markings from both known table
//! layouts, and writes every accepted round as a JSON record.

pub mod config;
pub mod harvest;
pub mod model;
pub mod output;
pub mod url;

use model::CategoryCode;
use thiserror::Error;

/// Main error type for Open Markings operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("Failed to parse {url}: {source}")]
    Parse { url: String, source: ParseError },

    #[error("Page not found: {url}")]
    NotFound { url: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid year range: {0}")]
    InvalidYears(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Not a round markings page: {0}")]
    NotARoundPage(String),
}

/// Failure of a single page fetch
///
/// `NotFound` is deliberately absent: a missing page is an expected outcome of
/// probing and is reported through [`harvest::FetchOutcome::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("server error (HTTP {0})")]
    ServerError(u16),

    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("client error (HTTP {0})")]
    ClientError(u16),
}

impl FetchError {
    /// Returns true if retrying the request may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::ClientError(_))
    }
}

/// Failure to turn fetched pages into a competition record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing competition metadata: {0}")]
    MissingMetadata(&'static str),

    #[error(
        "category {category} of couple {start_number} has {found} judge scores, expected {expected}"
    )]
    CategoryJudgeMismatch {
        start_number: String,
        category: CategoryCode,
        expected: usize,
        found: usize,
    },

    #[error("results table has no couples")]
    EmptyResult,

    #[error("no known results table layout")]
    UnknownLayout,
}

/// Result type alias for Open Markings operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{discover, run_harvest, scrape_urls, Discovery, FetchOutcome, PageSource};
pub use model::{CompetitionRecord, Filter, RoundKind, YearRange};
pub use output::RunSummary;
