//! Run statistics
//!
//! This module provides the summary a run produces and its console rendering.

use crate::harvest::CompetitionReport;
use crate::HarvestError;
use std::collections::BTreeMap;
use std::time::Duration;

/// A failure recorded for one page or competition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    /// Page the failure belongs to, empty when it has none
    pub url: String,

    /// Error description
    pub error: String,
}

impl TaskError {
    pub fn new(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: error.into(),
        }
    }

    /// Records an error, keeping the page URL when the error carries one
    pub fn from_error(error: &HarvestError) -> Self {
        let url = match error {
            HarvestError::Fetch { url, .. }
            | HarvestError::Parse { url, .. }
            | HarvestError::NotFound { url } => url.clone(),
            _ => String::new(),
        };
        Self::new(url, error.to_string())
    }
}

/// Summary of a discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Competition IDs whose outcome was committed
    pub competitions_probed: u64,

    /// Competitions whose event header exists
    pub competitions_found: u64,

    /// Competitions with at least one round page
    pub competitions_with_rounds: u64,

    /// Round pages found
    pub rounds_found: u64,

    /// Records that passed the filter
    pub accepted: u64,

    /// Records the filter discarded
    pub rejected: u64,

    /// Records written to disk
    pub written: u64,

    /// Per-task errors, in commit order
    pub errors: Vec<TaskError>,

    /// Competition ID at which each stopped year was cut off
    pub stopped_years: BTreeMap<i32, u32>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Adds a committed competition report
    pub fn record(&mut self, report: &CompetitionReport) {
        self.competitions_probed += 1;
        if report.exists {
            self.competitions_found += 1;
        }
        if !report.rounds.is_empty() {
            self.competitions_with_rounds += 1;
        }
        self.rounds_found += report.rounds.len() as u64;
        self.accepted += report.accepted.len() as u64;
        self.rejected += report.rejected as u64;
        self.errors.extend(report.errors.iter().cloned());
    }

    /// Number of failed pages and competitions
    pub fn errored(&self) -> u64 {
        self.errors.len() as u64
    }
}

/// Prints the summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
/// * `max_errors` - How many individual errors to list
pub fn print_summary(summary: &RunSummary, max_errors: usize) {
    println!("=== Discovery Summary ===\n");

    println!("Competitions:");
    println!("  Probed: {}", summary.competitions_probed);
    println!("  Found: {}", summary.competitions_found);
    println!("  With rounds: {}", summary.competitions_with_rounds);
    println!();

    println!("Rounds:");
    println!("  Found: {}", summary.rounds_found);
    println!("  Accepted: {}", summary.accepted);
    println!("  Rejected: {}", summary.rejected);
    println!("  Errored: {}", summary.errored());
    println!("  Written: {}", summary.written);
    println!();

    if !summary.stopped_years.is_empty() {
        println!("Years stopped by the competition gap:");
        for (year, competition_id) in &summary.stopped_years {
            println!("  {} after ID {:04}", year, competition_id);
        }
        println!();
    }

    if !summary.errors.is_empty() {
        println!("Errors ({}):", summary.errors.len());
        for error in summary.errors.iter().take(max_errors) {
            if error.url.is_empty() {
                println!("  - {}", error.error);
            } else {
                println!("  - {}: {}", error.url, error.error);
            }
        }
        if summary.errors.len() > max_errors {
            println!("  ... and {} more", summary.errors.len() - max_errors);
        }
        println!();
    }

    println!("Finished in {:.1}s", summary.elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;

    #[test]
    fn test_record_report() {
        let mut summary = RunSummary::default();

        let empty = CompetitionReport {
            year: 2025,
            competition_id: 1,
            ..CompetitionReport::default()
        };
        let found = CompetitionReport {
            year: 2025,
            competition_id: 2,
            exists: true,
            rounds: vec![1001, 1002],
            rejected: 1,
            errors: vec![TaskError::new("http://results.test/ocj_1002.htm", "boom")],
            ..CompetitionReport::default()
        };

        summary.record(&empty);
        summary.record(&found);

        assert_eq!(summary.competitions_probed, 2);
        assert_eq!(summary.competitions_found, 1);
        assert_eq!(summary.competitions_with_rounds, 1);
        assert_eq!(summary.rounds_found, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.errored(), 1);
    }

    #[test]
    fn test_task_error_keeps_url() {
        let error = HarvestError::Fetch {
            url: "http://results.test/naslov.htm".to_string(),
            source: FetchError::Timeout,
        };
        let task_error = TaskError::from_error(&error);
        assert_eq!(task_error.url, "http://results.test/naslov.htm");
        assert!(task_error.error.contains("timed out"));

        let task_error = TaskError::from_error(&HarvestError::Worker("panicked".to_string()));
        assert_eq!(task_error.url, "");
    }
}
