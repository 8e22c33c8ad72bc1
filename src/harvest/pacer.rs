use crate::harvest::source::{FetchOutcome, PageSource};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

/// Tracks the request timing of one worker
///
/// Each worker owns a pacer, so the delay applies between the worker's own
/// successive requests and never serializes the pool.
#[derive(Debug, Clone)]
pub struct Pacer {
    /// Minimum time between two requests
    min_delay: Duration,

    /// Timestamp of the last request
    last_request_time: Option<Instant>,

    /// Number of requests made so far
    request_count: u64,
}

impl Pacer {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request_time: None,
            request_count: 0,
        }
    }

    /// Checks if a request can be made now
    pub fn can_request(&self, now: Instant) -> bool {
        self.time_until_next_request(now).is_none()
    }

    /// Records that a request was made
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_delay {
            Some(self.min_delay - elapsed)
        } else {
            None
        }
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }
}

/// A page source that spaces its requests out with a [`Pacer`]
pub struct PacedSource {
    inner: Arc<dyn PageSource>,
    pacer: Mutex<Pacer>,
}

impl PacedSource {
    pub fn new(inner: Arc<dyn PageSource>, min_delay: Duration) -> Self {
        Self {
            inner,
            pacer: Mutex::new(Pacer::new(min_delay)),
        }
    }

    /// Sleeps until the pacer allows the next request, then records it
    async fn wait_turn(&self) {
        let wait = self
            .pacer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .time_until_next_request(Instant::now());

        if let Some(wait) = wait {
            tokio::time::sleep(wait).await;
        }

        self.pacer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_request(Instant::now());
    }

    /// Number of requests this source has let through
    pub fn request_count(&self) -> u64 {
        self.pacer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .request_count()
    }
}

#[async_trait]
impl PageSource for PacedSource {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        self.wait_turn().await;
        self.inner.fetch(url).await
    }
}
