use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Open Markings
///
/// Every section and key is optional; missing values fall back to the defaults
/// below, so an empty file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub discovery: DiscoveryConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub filter: FilterConfig,
}

/// Worker pool, politeness and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Number of parallel workers
    pub workers: u32,

    /// Minimum time between two requests of the same worker (milliseconds)
    pub request_delay_ms: u64,

    /// Total timeout of a single request (seconds)
    pub timeout_secs: u64,

    /// Connect timeout of a single request (seconds)
    pub connect_timeout_secs: u64,

    /// Retries after a transient failure
    pub max_retries: u32,

    /// Backoff before the first retry, doubled for every further retry (milliseconds)
    pub retry_backoff_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            request_delay_ms: 250,
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Inclusive window of competition IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IdWindow {
    pub first: u32,
    pub last: u32,
}

impl IdWindow {
    /// Number of IDs in the window
    pub fn size(&self) -> u64 {
        u64::from(self.last.saturating_sub(self.first)) + 1
    }
}

/// Competition ID window for one year
#[derive(Debug, Clone, Deserialize)]
pub struct YearWindow {
    pub year: i32,
    pub first: u32,
    pub last: u32,
}

/// Identifier space probing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Root of the results site; competitions live at `{base-url}{year}-{id}/`
    pub base_url: String,

    /// First round number probed in every competition
    pub first_round: u32,

    /// Last round number probed in every competition
    pub last_round: u32,

    /// Consecutive missing rounds after which a competition is considered exhausted
    pub round_gap_tolerance: u32,

    /// Consecutive competitions without rounds after which a year is considered exhausted
    pub competition_gap_tolerance: u32,

    /// Competition ID window for years without an explicit window
    pub default_window: IdWindow,

    /// Per-year competition ID windows
    #[serde(rename = "window")]
    pub windows: Vec<YearWindow>,
}

impl DiscoveryConfig {
    /// Returns the competition ID window to probe for a year
    pub fn window_for(&self, year: i32) -> IdWindow {
        self.windows
            .iter()
            .find(|window| window.year == year)
            .map(|window| IdWindow {
                first: window.first,
                last: window.last,
            })
            .unwrap_or(self.default_window)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.wrrc.org/results/".to_string(),
            first_round: 1000,
            last_round: 3000,
            round_gap_tolerance: 25,
            competition_gap_tolerance: 200,
            default_window: IdWindow {
                first: 0,
                last: 9999,
            },
            windows: Vec::new(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the scraper
    pub crawler_name: String,

    /// Version of the scraper
    pub crawler_version: String,

    /// URL with information about the scraper operator
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "OpenMarkings".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the JSON records are written to
    pub results_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: "results".to_string(),
        }
    }
}

/// Record filter configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Dance filter, e.g. `BW` or `Boogie Woogie`
    pub dance: Option<String>,

    /// Class filter, e.g. `Main Class`
    #[serde(rename = "class")]
    pub class_name: Option<String>,

    /// Round filter, e.g. `Final` or `Semi`
    pub round: Option<String>,

    /// Year or inclusive year range, e.g. `2025` or `2022-2025`
    pub years: Option<String>,

    /// Extra abbreviations for the dance and class filters
    pub aliases: BTreeMap<String, Vec<String>>,

    /// Write slow and fast heats of slow/fast rounds as separate records
    pub split_heats: bool,
}
