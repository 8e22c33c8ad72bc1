//! URL scheme of the results site
//!
//! Every competition lives in its own directory, `{base}{year}-{id:04}/`, which
//! holds a fixed set of pages:
//! - `naslov.htm`: event header (title, location, date)
//! - `turnir_naslov.htm`: judge panel
//! - `ocj_{round}.htm`: open markings of one round
//! - `rez_{round}.htm`: result list with competitor names

use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

const EVENT_HEADER_PAGE: &str = "naslov.htm";
const JUDGE_PANEL_PAGE: &str = "turnir_naslov.htm";
const MARKINGS_PREFIX: &str = "ocj_";
const COMPETITORS_PREFIX: &str = "rez_";
const PAGE_SUFFIX: &str = ".htm";

/// Parses the site root, making sure relative joins stay below it
///
/// # Example
///
/// ```
/// use open_markings::url::parse_base_url;
///
/// let base = parse_base_url("https://www.wrrc.org/results").unwrap();
/// assert_eq!(base.as_str(), "https://www.wrrc.org/results/");
/// ```
pub fn parse_base_url(base: &str) -> UrlResult<Url> {
    let mut url = Url::parse(base.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Directory of one competition on the results site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionUrls {
    root: Url,
}

impl CompetitionUrls {
    /// Directory of the competition `{year}-{id:04}` below the site root
    pub fn for_competition(base: &Url, year: i32, competition_id: u32) -> UrlResult<Self> {
        let root = base
            .join(&format!("{}-{:04}/", year, competition_id))
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        Ok(Self { root })
    }

    /// Splits an explicit markings URL (`.../ocj_{n}.htm`) into its competition
    /// directory and round number
    pub fn from_markings_url(url: &Url) -> UrlResult<(Self, u32)> {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();

        let round_number = file_name
            .strip_prefix(MARKINGS_PREFIX)
            .and_then(|rest| rest.strip_suffix(PAGE_SUFFIX))
            .filter(|number| is_canonical_number(number))
            .and_then(|number| number.parse::<u32>().ok())
            .ok_or_else(|| UrlError::NotARoundPage(url.to_string()))?;

        let root = url
            .join("./")
            .map_err(|e| UrlError::Parse(e.to_string()))?;

        Ok((Self { root }, round_number))
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    /// `naslov.htm`
    pub fn event_header(&self) -> UrlResult<Url> {
        self.page(EVENT_HEADER_PAGE)
    }

    /// `turnir_naslov.htm`
    pub fn judge_panel(&self) -> UrlResult<Url> {
        self.page(JUDGE_PANEL_PAGE)
    }

    /// `ocj_{round}.htm`
    pub fn markings(&self, round_number: u32) -> UrlResult<Url> {
        self.page(&format!("{}{}{}", MARKINGS_PREFIX, round_number, PAGE_SUFFIX))
    }

    /// `rez_{round}.htm`
    pub fn competitors(&self, round_number: u32) -> UrlResult<Url> {
        self.page(&format!(
            "{}{}{}",
            COMPETITORS_PREFIX, round_number, PAGE_SUFFIX
        ))
    }

    fn page(&self, name: &str) -> UrlResult<Url> {
        self.root
            .join(name)
            .map_err(|e| UrlError::Parse(e.to_string()))
    }
}

/// A candidate round page produced while probing the identifier space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscoveryTarget {
    pub year: i32,
    pub competition_id: u32,
    pub round_number: u32,
}

impl DiscoveryTarget {
    /// URL of the round's markings page
    pub fn url(&self, base: &Url) -> UrlResult<Url> {
        CompetitionUrls::for_competition(base, self.year, self.competition_id)?
            .markings(self.round_number)
    }
}

impl fmt::Display for DiscoveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:04} round {}",
            self.year, self.competition_id, self.round_number
        )
    }
}

/// Plain decimal digits without leading zeros, so the number formats back to
/// the same file name
fn is_canonical_number(number: &str) -> bool {
    !number.is_empty()
        && number.bytes().all(|b| b.is_ascii_digit())
        && !(number.len() > 1 && number.starts_with('0'))
}
