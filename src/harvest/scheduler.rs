//! Parallel scheduler for competition probes
//!
//! This module handles:
//! - The shared work queue of competition IDs, per year and in ID order
//! - A bounded pool of workers, each pacing its own requests
//! - A single aggregator that commits reports in ID order, stops exhausted
//!   years and builds the run summary
//!
//! The work queue is the only state shared behind a mutex; everything the
//! aggregator owns is touched by the aggregator alone.

use crate::config::IdWindow;
use crate::harvest::cursor::YearCursor;
use crate::harvest::discoverer::{CompetitionProber, CompetitionReport};
use crate::harvest::pacer::PacedSource;
use crate::harvest::source::PageSource;
use crate::model::CompetitionRecord;
use crate::output::{RunSummary, TaskError};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Competition IDs still to be issued for one year
#[derive(Debug, Clone)]
struct YearWork {
    year: i32,
    next: u32,
    last: u32,
}

/// Work queue shared by all workers
///
/// IDs are issued year by year, each year in ascending ID order.
#[derive(Debug, Default)]
pub struct WorkQueue {
    years: Mutex<VecDeque<YearWork>>,
}

impl WorkQueue {
    pub fn new(windows: &[(i32, IdWindow)]) -> Self {
        let years = windows
            .iter()
            .filter(|(_, window)| window.first <= window.last)
            .map(|(year, window)| YearWork {
                year: *year,
                next: window.first,
                last: window.last,
            })
            .collect();

        Self {
            years: Mutex::new(years),
        }
    }

    /// Takes the next competition to probe
    pub fn next(&self) -> Option<(i32, u32)> {
        let mut years = self.years.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            let work = years.front_mut()?;
            if work.next > work.last {
                years.pop_front();
                continue;
            }

            let id = work.next;
            let year = work.year;
            match work.next.checked_add(1) {
                Some(next) => work.next = next,
                None => {
                    years.pop_front();
                }
            }
            return Some((year, id));
        }
    }

    /// Stops issuing IDs for a year
    pub fn stop_year(&self, year: i32) {
        self.years
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|work| work.year != year);
    }

    /// Number of IDs not issued yet
    pub fn remaining(&self) -> u64 {
        self.years
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|work| u64::from(work.last) - u64::from(work.next) + 1)
            .sum()
    }
}

/// Settings of the worker pool
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub workers: usize,
    pub request_delay: Duration,
    pub competition_gap_tolerance: u32,
}

/// Fans competition probes out over a worker pool
pub struct Scheduler {
    prober: Arc<CompetitionProber>,
    source: Arc<dyn PageSource>,
    settings: PoolSettings,
    windows: Vec<(i32, IdWindow)>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `prober` - Probes a single competition
    /// * `source` - Page source shared by every worker
    /// * `settings` - Worker count, request delay and competition gap tolerance
    /// * `windows` - Competition ID window of every year to discover
    pub fn new(
        prober: CompetitionProber,
        source: Arc<dyn PageSource>,
        settings: PoolSettings,
        windows: Vec<(i32, IdWindow)>,
    ) -> Self {
        Self {
            prober: Arc::new(prober),
            source,
            settings,
            windows,
        }
    }

    /// Runs discovery to completion
    ///
    /// Accepted records are sent on `records` as soon as they are committed.
    /// A closed `records` channel does not stop the run.
    ///
    /// # Returns
    ///
    /// The run summary; `written` is left at zero for the caller to fill in.
    pub async fn run(self, records: mpsc::Sender<CompetitionRecord>) -> RunSummary {
        let start_time = Instant::now();
        let queue = Arc::new(WorkQueue::new(&self.windows));
        let worker_count = self.settings.workers.max(1);

        tracing::info!(
            "Starting discovery with {} workers over {} competition IDs",
            worker_count,
            queue.remaining()
        );

        let (report_tx, report_rx) = mpsc::channel(worker_count * 2);

        let handles: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|worker_id| {
                let source = PacedSource::new(self.source.clone(), self.settings.request_delay);
                tokio::spawn(worker(
                    worker_id,
                    queue.clone(),
                    self.prober.clone(),
                    source,
                    report_tx.clone(),
                ))
            })
            .collect();
        drop(report_tx);

        let mut aggregator = Aggregator::new(
            &self.windows,
            self.settings.competition_gap_tolerance,
            queue,
            records,
        );
        aggregator.consume(report_rx).await;

        for (worker_id, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!("Worker {} failed: {}", worker_id, e);
                aggregator
                    .summary
                    .errors
                    .push(TaskError::new("", format!("worker {} failed: {}", worker_id, e)));
            }
        }

        let mut summary = aggregator.finish().await;
        summary.elapsed = start_time.elapsed();

        tracing::info!(
            "Discovery complete: {} competitions probed, {} rounds found, {} accepted in {:.1}s",
            summary.competitions_probed,
            summary.rounds_found,
            summary.accepted,
            summary.elapsed.as_secs_f64()
        );
        summary
    }
}

/// Takes competitions from the queue until it runs dry
async fn worker(
    worker_id: usize,
    queue: Arc<WorkQueue>,
    prober: Arc<CompetitionProber>,
    source: PacedSource,
    reports: mpsc::Sender<CompetitionReport>,
) {
    while let Some((year, competition_id)) = queue.next() {
        let report = prober.probe(&source, year, competition_id).await;
        if reports.send(report).await.is_err() {
            break;
        }
    }

    tracing::debug!(
        "Worker {} done after {} requests",
        worker_id,
        source.request_count()
    );
}

/// Sole owner of the per-year cursors and the summary
struct Aggregator {
    cursors: BTreeMap<i32, YearCursor>,
    queue: Arc<WorkQueue>,
    records: mpsc::Sender<CompetitionRecord>,
    summary: RunSummary,
}

impl Aggregator {
    fn new(
        windows: &[(i32, IdWindow)],
        tolerance: u32,
        queue: Arc<WorkQueue>,
        records: mpsc::Sender<CompetitionRecord>,
    ) -> Self {
        let cursors = windows
            .iter()
            .map(|(year, window)| {
                (
                    *year,
                    YearCursor::new(*year, window.first, window.last, tolerance),
                )
            })
            .collect();

        Self {
            cursors,
            queue,
            records,
            summary: RunSummary::default(),
        }
    }

    async fn consume(&mut self, mut reports: mpsc::Receiver<CompetitionReport>) {
        while let Some(report) = reports.recv().await {
            let year = report.year;
            let Some(cursor) = self.cursors.get_mut(&year) else {
                tracing::warn!("Report for unexpected year {}", year);
                continue;
            };

            let was_stopped = cursor.is_stopped();
            let committed = cursor.push(report);
            let stop_id = cursor.stop_id().filter(|_| !was_stopped);

            if let Some(stop_id) = stop_id {
                self.queue.stop_year(year);
                self.summary.stopped_years.insert(year, stop_id);
            }

            self.commit(committed).await;
        }
    }

    async fn commit(&mut self, reports: Vec<CompetitionReport>) {
        for report in reports {
            self.summary.record(&report);

            if self.summary.competitions_probed % 10 == 0 {
                tracing::info!(
                    "Progress: {} competitions probed, {} with rounds, {} records accepted",
                    self.summary.competitions_probed,
                    self.summary.competitions_with_rounds,
                    self.summary.accepted
                );
            }

            for record in report.accepted {
                if self.records.send(record).await.is_err() {
                    tracing::trace!("Record receiver closed, dropping record");
                }
            }
        }
    }

    /// Flushes what never got committed in order and returns the summary
    async fn finish(mut self) -> RunSummary {
        let mut leftovers = Vec::new();
        for cursor in self.cursors.values_mut() {
            leftovers.extend(cursor.finish());
        }
        self.commit(leftovers).await;
        self.summary
    }
}
