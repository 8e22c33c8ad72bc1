//! Page parser
//!
//! A round's data is spread over four pages of the competition directory:
//! - the event header with location and date
//! - the judge panel
//! - the markings table with the scores (two known layouts)
//! - the result list with competitor names (optional)
//!
//! [`parse_round`] assembles them into [`CompetitionRecord`]s.

mod competitors;
mod header;
mod judges;
mod layout;
mod markings;

pub use competitors::parse_competitor_names;
pub use header::EventHeader;
pub use judges::JudgePanel;
pub use layout::{ExtractedRows, LayoutKind, MarkingsPage, RoundTitle};
pub use markings::parse_score_cell;

use crate::model::{year_of_date, CompetitionInfo, CompetitionRecord, Couple, Heat, Judge};
use crate::ParseError;
use scraper::{ElementRef, Selector};

/// Competition-level pages, fetched once per competition
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub header: EventHeader,
    pub panel: JudgePanel,
}

impl EventContext {
    /// Parses the event header and, when present, the judge panel
    pub fn parse(header_html: &str, panel_html: Option<&str>) -> Self {
        Self {
            header: EventHeader::parse(header_html),
            panel: panel_html.map(JudgePanel::parse).unwrap_or_default(),
        }
    }
}

/// The pages one round is assembled from
#[derive(Debug, Clone, Copy)]
pub struct RoundPages<'a> {
    pub event: &'a EventContext,
    pub markings: &'a str,
    pub competitors: Option<&'a str>,
}

/// Which records a slow/fast table produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeatSelection {
    /// One record from the fast rows
    #[default]
    FastOnly,

    /// One record per heat, tagged with the heat
    Split,
}

impl HeatSelection {
    pub fn from_split_flag(split_heats: bool) -> Self {
        if split_heats {
            Self::Split
        } else {
            Self::FastOnly
        }
    }
}

/// Parses one round into records
///
/// Standard tables always produce one record; slow/fast tables produce one or
/// two depending on `heats`.
///
/// # Errors
///
/// * `UnknownLayout` - no results table on the markings page
/// * `MissingMetadata` - no location or no readable date in the event header,
///   or no `Round>>Dance-Class` heading
/// * `CategoryJudgeMismatch` - a category lists a different number of judge
///   scores than the round has judges
/// * `EmptyResult` - the table has no couples
pub fn parse_round(
    pages: &RoundPages<'_>,
    heats: HeatSelection,
) -> Result<Vec<CompetitionRecord>, ParseError> {
    let location = pages
        .event
        .header
        .location
        .clone()
        .ok_or(ParseError::MissingMetadata("location"))?;
    let date = pages
        .event
        .header
        .date
        .clone()
        .filter(|date| year_of_date(date).is_some())
        .ok_or(ParseError::MissingMetadata("date"))?;

    let page = MarkingsPage::parse(pages.markings);
    let layout = page.detect()?;
    let title = page
        .round_title()
        .ok_or(ParseError::MissingMetadata("round"))?;
    let rows = page.extract(layout)?;
    tracing::trace!(
        "Extracted {} couples from {} table ({} {})",
        rows.couple_count(),
        layout,
        title.round,
        title.dance
    );

    let judges = pages.event.panel.for_category(&title.dance, &title.class_name);
    let names = pages
        .competitors
        .map(parse_competitor_names)
        .unwrap_or_default();

    let heats: Vec<(Option<Heat>, Vec<Couple>)> = match (rows, heats) {
        (ExtractedRows::Standard(couples), _) => vec![(None, couples)],
        (ExtractedRows::SlowFast { fast, .. }, HeatSelection::FastOnly) => vec![(None, fast)],
        (ExtractedRows::SlowFast { slow, fast }, HeatSelection::Split) => {
            vec![(Some(Heat::Slow), slow), (Some(Heat::Fast), fast)]
        }
    };

    let mut records = Vec::new();
    for (heat, mut couples) in heats {
        if couples.is_empty() {
            continue;
        }

        for couple in &mut couples {
            check_judge_counts(couple, &judges)?;
            if let Some(name) = names.get(&couple.start_number) {
                couple.competitor_names = name.clone();
            }
        }

        records.push(CompetitionRecord {
            competition_info: CompetitionInfo {
                location: location.clone(),
                date: date.clone(),
                round: title.round.clone(),
                dance: title.dance.clone(),
                class_name: title.class_name.clone(),
                judges: judges.clone(),
                heat,
            },
            couples,
        });
    }

    if records.is_empty() {
        return Err(ParseError::EmptyResult);
    }

    Ok(records)
}

/// Every scored category needs exactly one score per judge
///
/// Only blank cells, with neither an aggregated score nor judge scores, are
/// exempt.
fn check_judge_counts(couple: &Couple, judges: &[Judge]) -> Result<(), ParseError> {
    for (code, score) in &couple.categories {
        let blank = score.aggregated.is_empty() && score.judge_scores.is_empty();
        if !blank && score.judge_scores.len() != judges.len() {
            return Err(ParseError::CategoryJudgeMismatch {
                start_number: couple.start_number.clone(),
                category: *code,
                expected: judges.len(),
                found: score.judge_scores.len(),
            });
        }
    }
    Ok(())
}

/// All descendants of `scope` matching `css`, in document order
pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// The `td`/`th` children of a table row
pub(crate) fn direct_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| matches!(child.value().name(), "td" | "th"))
        .collect()
}

/// Text of an element with every text node trimmed and joined
pub(crate) fn flat_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Non-empty trimmed text nodes of an element; `<br>` separates lines
pub(crate) fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// `"Lastname Firstname"` becomes `"Firstname Lastname"`; single words are kept
pub(crate) fn given_name_first(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.split_first() {
        Some((last, given)) if !given.is_empty() => format!("{} {}", given.join(" "), last),
        _ => parts.join(" "),
    }
}
