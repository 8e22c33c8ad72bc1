//! Page sources
//!
//! The discoverer never talks to the network directly; it asks a [`PageSource`]
//! for pages. The HTTP fetcher is the production source, tests use an in-memory one.

use crate::FetchError;
use async_trait::async_trait;
use url::Url;

/// Outcome of fetching one page
///
/// A missing page is an expected result of probing, not an error, so it has
/// its own variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page exists; carries the HTML body
    Found(String),

    /// HTTP 404 or 410
    NotFound,

    /// Any other failure, after retries were exhausted
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Something that can fetch result pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches one page
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}
