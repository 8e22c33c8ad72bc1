//! Competition record types
//!
//! These types mirror the JSON files the engine writes, one record per round
//! (or per heat of a slow/fast round). Every numeric field is kept as the text
//! the source page shows, decimal commas included.

use crate::model::RoundKind;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the five scoring categories of a boogie woogie round
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryCode {
    /// Boogie Woogie Basics - Woman
    #[serde(rename = "BBW")]
    Bbw,
    /// Boogie Woogie Basics - Man
    #[serde(rename = "BBM")]
    Bbm,
    /// Lead and follow
    #[serde(rename = "LF")]
    Lf,
    /// Dance figures
    #[serde(rename = "DF")]
    Df,
    /// Music interpretation
    #[serde(rename = "MI")]
    Mi,
}

impl CategoryCode {
    /// All categories in the column order of the results table
    pub const ALL: [CategoryCode; 5] = [Self::Bbw, Self::Bbm, Self::Lf, Self::Df, Self::Mi];

    /// Short code as printed in the table header
    pub fn code(&self) -> &'static str {
        match self {
            Self::Bbw => "BBW",
            Self::Bbm => "BBM",
            Self::Lf => "LF",
            Self::Df => "DF",
            Self::Mi => "MI",
        }
    }

    /// Long category name stored alongside the scores
    pub fn long_name(&self) -> &'static str {
        match self {
            Self::Bbw => "Boogie Woogie Basics - Woman",
            Self::Bbm => "Boogie Woogie Basics - Man",
            Self::Lf => "Lead and follow, basic dancing, harmony, dance performance",
            Self::Df => "Dance Figures (how do they present)",
            Self::Mi => "Music Interpretation (what do they present)",
        }
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Half of a slow/fast round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heat {
    Slow,
    Fast,
}

impl Heat {
    /// Label of the row type cell on the results page
    pub fn row_label(&self) -> &'static str {
        match self {
            Self::Slow => "Slow:",
            Self::Fast => "Fast:",
        }
    }
}

impl fmt::Display for Heat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slow => f.write_str("Slow"),
            Self::Fast => f.write_str("Fast"),
        }
    }
}

/// A judge sitting on the panel of a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judge {
    pub letter: char,
    pub name: String,
    pub country: String,
}

/// Scores of one couple in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Long category name
    pub name: String,

    /// Aggregated category score, verbatim
    pub aggregated: String,

    /// One score per judge, in panel order, verbatim
    pub judge_scores: Vec<String>,
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Couple {
    pub start_number: String,
    pub position: String,
    pub teor: String,
    #[serde(default)]
    pub competitor_names: String,
    pub categories: BTreeMap<CategoryCode, CategoryScore>,
    pub sum: String,
    pub total: String,
    #[serde(default)]
    pub observer: String,
}

/// Round metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionInfo {
    pub location: String,

    /// Event date as `DD.MM.YYYY`
    pub date: String,

    /// Round label as printed, e.g. `Semi Final`
    pub round: String,

    pub dance: String,

    #[serde(rename = "class")]
    pub class_name: String,

    pub judges: Vec<Judge>,

    /// Set only when slow and fast heats are written as separate records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat: Option<Heat>,
}

/// Year of an event date
///
/// Accepts a single `DD.MM.YYYY` date or a multi-day range such as
/// `06.09.2025 - 07.09.2025`, in which case the first complete date counts.
pub fn year_of_date(date: &str) -> Option<i32> {
    let date = date.trim();
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%d.%m.%Y") {
        return Some(parsed.year());
    }

    date.split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_digit()))
        .find_map(|token| NaiveDate::parse_from_str(token, "%d.%m.%Y").ok())
        .map(|parsed| parsed.year())
}

/// A fully parsed round, ready to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionRecord {
    pub competition_info: CompetitionInfo,
    pub couples: Vec<Couple>,
}

impl CompetitionRecord {
    /// Classifies the round label
    pub fn round_kind(&self) -> RoundKind {
        RoundKind::from_label(&self.competition_info.round)
    }

    /// Year component of the event date, if the date is well formed
    pub fn year(&self) -> Option<i32> {
        year_of_date(&self.competition_info.date)
    }

    /// Short human-readable description for log lines
    pub fn describe(&self) -> String {
        let info = &self.competition_info;
        let mut label = format!(
            "{} {} {}-{} {}",
            info.location, info.date, info.dance, info.class_name, info.round
        );
        if let Some(heat) = info.heat {
            label.push_str(&format!(" ({})", heat));
        }
        label
    }
}
