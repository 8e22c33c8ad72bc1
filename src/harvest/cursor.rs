//! Ordered commit of competition reports
//!
//! Workers finish competitions out of order. A [`YearCursor`] buffers their
//! reports and releases them strictly in ID order, applying the competition
//! gap rule as it goes. Because the stop decision only ever looks at committed
//! reports, the set of committed competitions does not depend on timing or
//! worker count.

use crate::harvest::CompetitionReport;
use std::collections::BTreeMap;

/// Commit state of one year
#[derive(Debug)]
pub struct YearCursor {
    year: i32,

    /// Next competition ID to commit
    next_id: u32,

    last_id: u32,

    /// Committed competitions in a row without a valid round
    consecutive_empty: u32,

    tolerance: u32,

    /// ID of the competition that triggered the stop
    stop_id: Option<u32>,

    /// Reports that arrived before their predecessors
    pending: BTreeMap<u32, CompetitionReport>,
}

impl YearCursor {
    pub fn new(year: i32, first_id: u32, last_id: u32, tolerance: u32) -> Self {
        Self {
            year,
            next_id: first_id,
            last_id,
            consecutive_empty: 0,
            tolerance,
            stop_id: None,
            pending: BTreeMap::new(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Accepts one report and returns every report that is now committable
    ///
    /// # Arguments
    ///
    /// * `report` - A finished competition probe of this year
    ///
    /// # Returns
    ///
    /// The committed reports in ID order. Reports beyond the stop point are
    /// discarded and never returned.
    pub fn push(&mut self, report: CompetitionReport) -> Vec<CompetitionReport> {
        if self.is_stopped() || report.competition_id < self.next_id {
            tracing::trace!(
                "{}-{:04}: discarded after stop",
                self.year,
                report.competition_id
            );
            return Vec::new();
        }

        self.pending.insert(report.competition_id, report);

        let mut committed = Vec::new();
        while !self.is_stopped() && self.next_id <= self.last_id {
            let Some(report) = self.pending.remove(&self.next_id) else {
                break;
            };
            self.commit(report, &mut committed);
        }
        committed
    }

    /// Commits whatever is still pending, skipping IDs that never reported
    pub fn finish(&mut self) -> Vec<CompetitionReport> {
        let mut committed = Vec::new();
        while !self.is_stopped() {
            let Some((_, report)) = self.pending.pop_first() else {
                break;
            };
            if report.competition_id != self.next_id {
                tracing::warn!(
                    "{}: competitions {:04}..{:04} never reported",
                    self.year,
                    self.next_id,
                    report.competition_id
                );
            }
            self.commit(report, &mut committed);
        }
        self.pending.clear();
        committed
    }

    fn commit(&mut self, report: CompetitionReport, committed: &mut Vec<CompetitionReport>) {
        let competition_id = report.competition_id;

        if report.is_empty() {
            self.consecutive_empty += 1;
        } else {
            self.consecutive_empty = 0;
        }

        self.next_id = competition_id.saturating_add(1);
        committed.push(report);

        if self.consecutive_empty >= self.tolerance {
            tracing::info!(
                "{}: {} consecutive competitions without rounds, stopping after {:04}",
                self.year,
                self.consecutive_empty,
                competition_id
            );
            self.stop_id = Some(competition_id);
            self.pending.clear();
        }
    }

    /// True once the competition gap rule has fired
    pub fn is_stopped(&self) -> bool {
        self.stop_id.is_some()
    }

    pub fn stop_id(&self) -> Option<u32> {
        self.stop_id
    }

    /// True when nothing more will be committed for this year
    pub fn is_finished(&self) -> bool {
        self.is_stopped() || self.next_id > self.last_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(competition_id: u32, rounds: &[u32]) -> CompetitionReport {
        CompetitionReport {
            year: 2025,
            competition_id,
            exists: !rounds.is_empty(),
            rounds: rounds.to_vec(),
            ..CompetitionReport::default()
        }
    }

    fn ids(reports: &[CompetitionReport]) -> Vec<u32> {
        reports.iter().map(|r| r.competition_id).collect()
    }

    #[test]
    fn test_commits_in_id_order() {
        let mut cursor = YearCursor::new(2025, 1, 10, 5);

        assert!(cursor.push(report(3, &[1])).is_empty());
        assert!(cursor.push(report(2, &[])).is_empty());
        assert_eq!(ids(&cursor.push(report(1, &[1]))), vec![1, 2, 3]);
        assert_eq!(ids(&cursor.push(report(4, &[]))), vec![4]);
    }

    #[test]
    fn test_gap_stops_year() {
        let mut cursor = YearCursor::new(2025, 1, 100, 2);

        assert_eq!(ids(&cursor.push(report(1, &[1]))), vec![1]);
        assert_eq!(ids(&cursor.push(report(2, &[]))), vec![2]);
        assert!(!cursor.is_stopped());
        assert_eq!(ids(&cursor.push(report(3, &[]))), vec![3]);

        assert!(cursor.is_stopped());
        assert!(cursor.is_finished());
        assert_eq!(cursor.stop_id(), Some(3));
        assert!(cursor.push(report(4, &[1])).is_empty());
    }

    #[test]
    fn test_stop_ignores_arrival_order() {
        let mut cursor = YearCursor::new(2025, 1, 100, 2);

        // 4 has rounds but arrives before the gap at 2 and 3 is committed
        assert!(cursor.push(report(4, &[1])).is_empty());
        assert!(cursor.push(report(3, &[])).is_empty());
        assert!(cursor.push(report(2, &[])).is_empty());
        assert_eq!(ids(&cursor.push(report(1, &[1]))), vec![1, 2, 3]);

        assert_eq!(cursor.stop_id(), Some(3));
        assert!(cursor.finish().is_empty());
    }

    #[test]
    fn test_found_competition_resets_gap() {
        let mut cursor = YearCursor::new(2025, 1, 100, 2);

        cursor.push(report(1, &[]));
        cursor.push(report(2, &[1]));
        cursor.push(report(3, &[]));
        assert!(!cursor.is_stopped());
    }

    #[test]
    fn test_inconclusive_competition_resets_gap() {
        let mut cursor = YearCursor::new(2025, 1, 100, 2);

        cursor.push(report(1, &[]));
        cursor.push(CompetitionReport {
            inconclusive: true,
            ..report(2, &[])
        });
        cursor.push(report(3, &[]));
        assert!(!cursor.is_stopped());
    }

    #[test]
    fn test_window_end_finishes() {
        let mut cursor = YearCursor::new(2025, 7, 8, 5);

        cursor.push(report(7, &[]));
        assert!(!cursor.is_finished());
        cursor.push(report(8, &[]));
        assert!(cursor.is_finished());
        assert!(!cursor.is_stopped());
    }

    #[test]
    fn test_finish_skips_missing_reports() {
        let mut cursor = YearCursor::new(2025, 1, 10, 5);

        cursor.push(report(1, &[1]));
        cursor.push(report(3, &[1]));
        cursor.push(report(4, &[]));

        assert_eq!(ids(&cursor.finish()), vec![3, 4]);
    }
}
