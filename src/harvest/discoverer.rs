//! Identifier space discoverer
//!
//! The results site has no index, so competitions and rounds are found by
//! probing candidate URLs:
//! - a competition exists when its event header page exists
//! - its rounds are probed upward from the first round number until
//!   `round_gap_tolerance` consecutive pages are missing
//!
//! Only a missing page counts as a miss; a failed fetch or an unparseable page
//! resets the counter.

use crate::config::Config;
use crate::harvest::classifier::accept;
use crate::harvest::parser::{parse_round, EventContext, HeatSelection, RoundPages};
use crate::harvest::source::{FetchOutcome, PageSource};
use crate::model::{CompetitionRecord, Filter};
use crate::output::TaskError;
use crate::url::{parse_base_url, CompetitionUrls, DiscoveryTarget};
use crate::{HarvestError, Result};
use url::Url;

/// Round probing parameters of a run
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub base_url: Url,
    pub first_round: u32,
    pub last_round: u32,
    pub round_gap_tolerance: u32,
    pub heats: HeatSelection,
}

impl ProbeSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&config.discovery.base_url)?,
            first_round: config.discovery.first_round,
            last_round: config.discovery.last_round,
            round_gap_tolerance: config.discovery.round_gap_tolerance,
            heats: HeatSelection::from_split_flag(config.filter.split_heats),
        })
    }
}

/// Everything probing one competition produced
#[derive(Debug, Clone, Default)]
pub struct CompetitionReport {
    pub year: i32,
    pub competition_id: u32,

    /// The event header page exists
    pub exists: bool,

    /// The probe could not decide whether the competition has rounds
    pub inconclusive: bool,

    /// Round numbers whose markings page exists
    pub rounds: Vec<u32>,

    /// Records that passed the filter, in round order
    pub accepted: Vec<CompetitionRecord>,

    /// Records the filter discarded
    pub rejected: usize,

    pub errors: Vec<TaskError>,
}

impl CompetitionReport {
    fn new(year: i32, competition_id: u32) -> Self {
        Self {
            year,
            competition_id,
            ..Self::default()
        }
    }

    /// True if the competition counts towards the per-year gap
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty() && !self.inconclusive
    }

    fn fail(&mut self, error: HarvestError) {
        tracing::warn!("{}-{:04}: {}", self.year, self.competition_id, error);
        self.errors.push(TaskError::from_error(&error));
    }
}

/// Outcome of loading one round
#[derive(Debug)]
pub enum RoundOutcome {
    /// The markings page does not exist
    NotFound,

    /// The markings page could not be fetched
    Failed(HarvestError),

    /// The markings page exists; carries the parsed records or the parse error
    Found(Result<Vec<CompetitionRecord>>),
}

/// Fetches and parses the competition-level pages
///
/// Returns `Ok(None)` when the event header does not exist. A missing judge
/// panel yields an empty panel.
pub async fn load_event(
    source: &dyn PageSource,
    urls: &CompetitionUrls,
) -> Result<Option<EventContext>> {
    let header_url = urls.event_header()?;
    let header = match source.fetch(&header_url).await {
        FetchOutcome::Found(html) => html,
        FetchOutcome::NotFound => return Ok(None),
        FetchOutcome::Failed(error) => {
            return Err(HarvestError::Fetch {
                url: header_url.to_string(),
                source: error,
            })
        }
    };

    let panel_url = urls.judge_panel()?;
    let panel = match source.fetch(&panel_url).await {
        FetchOutcome::Found(html) => Some(html),
        FetchOutcome::NotFound => {
            tracing::debug!("No judge panel at {}", panel_url);
            None
        }
        FetchOutcome::Failed(error) => {
            return Err(HarvestError::Fetch {
                url: panel_url.to_string(),
                source: error,
            })
        }
    };

    Ok(Some(EventContext::parse(&header, panel.as_deref())))
}

/// Fetches the markings and name pages of a round and parses them
pub async fn load_round(
    source: &dyn PageSource,
    urls: &CompetitionUrls,
    round_number: u32,
    event: &EventContext,
    heats: HeatSelection,
) -> RoundOutcome {
    let markings_url = match urls.markings(round_number) {
        Ok(url) => url,
        Err(e) => return RoundOutcome::Failed(e.into()),
    };

    let markings = match source.fetch(&markings_url).await {
        FetchOutcome::Found(html) => html,
        FetchOutcome::NotFound => return RoundOutcome::NotFound,
        FetchOutcome::Failed(error) => {
            return RoundOutcome::Failed(HarvestError::Fetch {
                url: markings_url.to_string(),
                source: error,
            })
        }
    };

    let competitors = match urls.competitors(round_number) {
        Ok(url) => match source.fetch(&url).await {
            FetchOutcome::Found(html) => Some(html),
            FetchOutcome::NotFound => None,
            FetchOutcome::Failed(error) => {
                tracing::debug!("Competitor names unavailable at {}: {}", url, error);
                None
            }
        },
        Err(_) => None,
    };

    let pages = RoundPages {
        event,
        markings: &markings,
        competitors: competitors.as_deref(),
    };

    RoundOutcome::Found(
        parse_round(&pages, heats).map_err(|error| HarvestError::Parse {
            url: markings_url.to_string(),
            source: error,
        }),
    )
}

/// Probes single competitions
#[derive(Debug, Clone)]
pub struct CompetitionProber {
    settings: ProbeSettings,
    filter: Filter,
}

impl CompetitionProber {
    pub fn new(settings: ProbeSettings, filter: Filter) -> Self {
        Self { settings, filter }
    }

    /// Probes one competition and classifies its rounds
    pub async fn probe(
        &self,
        source: &dyn PageSource,
        year: i32,
        competition_id: u32,
    ) -> CompetitionReport {
        let mut report = CompetitionReport::new(year, competition_id);

        let urls =
            match CompetitionUrls::for_competition(&self.settings.base_url, year, competition_id) {
                Ok(urls) => urls,
                Err(e) => {
                    report.inconclusive = true;
                    report.fail(e.into());
                    return report;
                }
            };

        let event = match load_event(source, &urls).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                tracing::trace!("{}-{:04} does not exist", year, competition_id);
                return report;
            }
            Err(e) => {
                report.inconclusive = true;
                report.fail(e);
                return report;
            }
        };

        report.exists = true;
        self.probe_rounds(source, &urls, &event, &mut report).await;

        tracing::debug!(
            "{}-{:04}: {} rounds, {} accepted, {} rejected, {} errors",
            year,
            competition_id,
            report.rounds.len(),
            report.accepted.len(),
            report.rejected,
            report.errors.len()
        );
        report
    }

    /// Walks the round numbers until the gap tolerance is exhausted
    async fn probe_rounds(
        &self,
        source: &dyn PageSource,
        urls: &CompetitionUrls,
        event: &EventContext,
        report: &mut CompetitionReport,
    ) {
        let mut misses = 0;

        for round_number in self.settings.first_round..=self.settings.last_round {
            if misses >= self.settings.round_gap_tolerance {
                tracing::trace!(
                    "{}: {} consecutive rounds missing, stopping",
                    DiscoveryTarget {
                        year: report.year,
                        competition_id: report.competition_id,
                        round_number,
                    },
                    misses
                );
                break;
            }

            match load_round(source, urls, round_number, event, self.settings.heats).await {
                RoundOutcome::NotFound => misses += 1,
                RoundOutcome::Failed(error) => {
                    misses = 0;
                    report.fail(error);
                }
                RoundOutcome::Found(parsed) => {
                    misses = 0;
                    report.rounds.push(round_number);

                    match parsed {
                        Ok(records) => {
                            for record in records {
                                if accept(&record, &self.filter) {
                                    report.accepted.push(record);
                                } else {
                                    tracing::trace!("Rejected {}", record.describe());
                                    report.rejected += 1;
                                }
                            }
                        }
                        Err(error) => report.fail(error),
                    }
                }
            }
        }
    }
}
