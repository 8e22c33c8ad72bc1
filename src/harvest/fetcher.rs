//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a run, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Classifying responses into found, not found and typed failures
//! - Retrying transient failures with exponential backoff
//! - Decoding page bodies from their declared charset

use crate::config::{Config, ScraperConfig, UserAgentConfig};
use crate::harvest::source::{FetchOutcome, PageSource};
use crate::FetchError;
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1250};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `scraper` - Timeouts of the run
/// * `user_agent` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    scraper: &ScraperConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(scraper.timeout_secs))
        .connect_timeout(Duration::from_secs(scraper.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page source backed by the results site
///
/// The client is built once per run; clones share its connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the run configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.scraper, &config.user_agent)?;
        Ok(Self::with_client(client, &config.scraper))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, scraper: &ScraperConfig) -> Self {
        Self {
            client,
            max_retries: scraper.max_retries,
            retry_backoff: Duration::from_millis(scraper.retry_backoff_ms),
        }
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | `Found` |
    /// | HTTP 404, 410 | `NotFound`, no retry |
    /// | HTTP 429, 5xx | Retry with backoff |
    /// | Timeout, connection failure | Retry with backoff |
    /// | Other HTTP 4xx | `ClientError`, no retry |
    ///
    /// The delay before retry `n` (counting from 0) is `retry_backoff * 2^n`.
    pub async fn fetch_with_retry(&self, url: &Url) -> FetchOutcome {
        let mut attempt = 0;

        loop {
            match self.fetch_once(url).await {
                FetchOutcome::Failed(error)
                    if error.is_transient() && attempt < self.max_retries =>
                {
                    let backoff = self.retry_backoff.saturating_mul(1u32 << attempt);
                    tracing::debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt + 1,
                        url,
                        error,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    /// Sends a single GET request and classifies the response
    async fn fetch_once(&self, url: &Url) -> FetchOutcome {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(classify_error(&e)),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return FetchOutcome::NotFound;
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return FetchOutcome::Failed(FetchError::RateLimited);
        }

        if status.is_server_error() {
            return FetchOutcome::Failed(FetchError::ServerError(status.as_u16()));
        }

        if !status.is_success() {
            return FetchOutcome::Failed(FetchError::ClientError(status.as_u16()));
        }

        let header_charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_param)
            .map(str::to_string);

        match response.bytes().await {
            Ok(bytes) => FetchOutcome::Found(decode_body(&bytes, header_charset.as_deref())),
            Err(e) => FetchOutcome::Failed(classify_error(&e)),
        }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        self.fetch_with_retry(url).await
    }
}

/// Number of leading bytes searched for a `<meta>` charset declaration
const META_SNIFF_LEN: usize = 1024;

/// Decodes a page body into text
///
/// The charset comes from the `Content-Type` header, then from a `<meta>`
/// declaration near the top of the page. Undeclared pages are UTF-8 when they
/// decode cleanly and windows-1250 otherwise, the codepage the results
/// software writes for Central European names.
///
/// A header claiming ISO-8859-1 never overrides the page's own declaration.
fn decode_body(bytes: &[u8], header_charset: Option<&str>) -> String {
    let declared = header_charset
        .filter(|label| !is_latin1_label(label))
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .or_else(|| meta_charset(bytes));

    let encoding = match declared {
        Some(encoding) => encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => WINDOWS_1250,
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Body is not valid {}, replaced bad sequences", used.name());
    }
    text.into_owned()
}

/// Finds `charset=<label>` in a `<meta>` tag within the first bytes of a page
fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LEN)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    head.match_indices("<meta")
        .filter_map(|(start, _)| {
            let tag = &head[start..];
            let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
            charset_param(tag)
        })
        .find_map(|label| Encoding::for_label(label.as_bytes()))
}

/// Extracts the value of a `charset=` parameter, unquoted
fn charset_param(text: &str) -> Option<&str> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let value = text[start..].trim_start_matches(['"', '\'', ' ']);
    let end = value
        .find(|c: char| matches!(c, '"' | '\'' | ';' | ' ' | '/' | '>'))
        .unwrap_or(value.len());

    Some(&value[..end]).filter(|label| !label.is_empty())
}

fn is_latin1_label(label: &str) -> bool {
    matches!(
        label.trim().to_ascii_lowercase().as_str(),
        "iso-8859-1" | "iso8859-1" | "latin1" | "l1"
    )
}

/// Maps a transport-level error to a fetch error
fn classify_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::ConnectionFailed("connection refused".to_string())
    } else {
        FetchError::ConnectionFailed(error.to_string())
    }
}
