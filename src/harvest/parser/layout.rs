//! Results table layouts
//!
//! The markings page comes in two shapes:
//! - `Standard`: one row per couple
//! - `SlowFast`: a slow row and a fast row per couple, with start number,
//!   position, teor and total shared through `rowspan="2"` cells
//!
//! The layout is detected once per page and extraction dispatches on it.

use crate::harvest::parser::markings::{extract_slow_fast, extract_standard};
use crate::harvest::parser::{flat_text, select_all};
use crate::model::Couple;
use crate::ParseError;
use scraper::{ElementRef, Html};
use std::fmt;

/// Number of leading cells searched for the results table header
const HEADER_PROBE_CELLS: usize = 10;

/// Known layout of the results table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Standard,
    SlowFast,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::SlowFast => f.write_str("slow/fast"),
        }
    }
}

/// Couples extracted from a results table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedRows {
    Standard(Vec<Couple>),
    SlowFast { slow: Vec<Couple>, fast: Vec<Couple> },
}

impl ExtractedRows {
    /// Number of couples, counting each couple of a slow/fast table once
    pub fn couple_count(&self) -> usize {
        match self {
            Self::Standard(couples) => couples.len(),
            Self::SlowFast { slow, fast } => slow.len().max(fast.len()),
        }
    }
}

/// Round, dance and class from the `Round>>Dance-Class` heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTitle {
    pub round: String,
    pub dance: String,
    pub class_name: String,
}

impl RoundTitle {
    /// Parses `"Semi Final>>Boogie Woogie-Main Class"`; dance and class are split
    /// on the last dash
    pub fn parse(text: &str) -> Option<Self> {
        let (round, dance_class) = text.split_once(">>")?;
        let (dance, class_name) = match dance_class.rsplit_once('-') {
            Some((dance, class_name)) => (dance.trim(), class_name.trim()),
            None => (dance_class.trim(), ""),
        };

        Some(Self {
            round: round.trim().to_string(),
            dance: dance.to_string(),
            class_name: class_name.to_string(),
        })
    }
}

/// A parsed markings page (`ocj_{round}.htm`)
pub struct MarkingsPage {
    document: Html,
}

impl MarkingsPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// The first table whose leading cells contain `Stn.` or `Position`
    fn results_table(&self) -> Option<ElementRef<'_>> {
        select_all(self.document.root_element(), "table")
            .into_iter()
            .find(|table| {
                select_all(*table, "th, td")
                    .into_iter()
                    .take(HEADER_PROBE_CELLS)
                    .map(flat_text)
                    .any(|text| text == "Stn." || text == "Position")
            })
    }

    /// Detects the table layout
    ///
    /// A `Type` header cell or `Slow:`/`Fast:` row labels mark a slow/fast table.
    pub fn detect(&self) -> Result<LayoutKind, ParseError> {
        let table = self.results_table().ok_or(ParseError::UnknownLayout)?;

        let slow_fast = select_all(table, "th, td").into_iter().any(|cell| {
            let text = flat_text(cell);
            text.eq_ignore_ascii_case("type") || text == "Slow:" || text == "Fast:"
        });

        Ok(if slow_fast {
            LayoutKind::SlowFast
        } else {
            LayoutKind::Standard
        })
    }

    /// Extracts the couples using the given layout
    pub fn extract(&self, layout: LayoutKind) -> Result<ExtractedRows, ParseError> {
        let table = self.results_table().ok_or(ParseError::UnknownLayout)?;
        let rows = select_all(table, "tr");

        Ok(match layout {
            LayoutKind::Standard => ExtractedRows::Standard(extract_standard(&rows)),
            LayoutKind::SlowFast => {
                let (slow, fast) = extract_slow_fast(&rows);
                ExtractedRows::SlowFast { slow, fast }
            }
        })
    }

    /// Finds the `Round>>Dance-Class` heading
    ///
    /// The table cells are searched first, then the page's `strong`, `h1` and `h2`
    /// elements.
    pub fn round_title(&self) -> Option<RoundTitle> {
        let from_table = self
            .results_table()
            .into_iter()
            .flat_map(|table| select_all(table, "th, td"));
        let from_headings = select_all(self.document.root_element(), "strong, h1, h2");

        from_table
            .chain(from_headings)
            .map(flat_text)
            .find(|text| text.contains(">>"))
            .and_then(|text| RoundTitle::parse(&text))
    }
}
