//! Integration tests for the harvest engine
//!
//! These tests use wiremock to serve result pages and run the fetcher,
//! discovery and direct scraping end-to-end. Wiremock answers every unmounted
//! path with 404, which is exactly what probing expects for absent pages.

use open_markings::config::{Config, YearWindow};
use open_markings::harvest::{run_harvest, scrape_urls, FetchOutcome, HttpFetcher};
use open_markings::{Filter, YearRange};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NASLOV: &str = include_str!("../fixtures/naslov.htm");
const PANEL: &str = include_str!("../fixtures/turnir_naslov.htm");
const MARKINGS: &str = include_str!("../fixtures/ocj_2010.htm");
const NAMES: &str = include_str!("../fixtures/rez_2010.htm");
const SLOW_FAST: &str = include_str!("../fixtures/ocj_slow_fast.htm");

const FINAL_FILE: &str = "results_Geneve_06-09-25_Boogie-Woogie_Main-Class_Final.json";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, results_dir: &Path) -> Config {
    let mut config = Config::default();
    config.discovery.base_url = format!("{}/", server.uri());
    config.discovery.first_round = 2008;
    config.discovery.last_round = 2030;
    config.discovery.round_gap_tolerance = 3;
    config.discovery.competition_gap_tolerance = 3;
    config.discovery.windows = vec![YearWindow {
        year: 2025,
        first: 3458,
        last: 3462,
    }];
    config.scraper.workers = 3;
    config.scraper.request_delay_ms = 0;
    config.scraper.max_retries = 1;
    config.scraper.retry_backoff_ms = 10;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.results_dir = results_dir.to_string_lossy().into_owned();
    config
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serves competition 2025-3459 with one standard round
async fn mount_competition(server: &MockServer) {
    mount_page(server, "/2025-3459/naslov.htm", NASLOV).await;
    mount_page(server, "/2025-3459/turnir_naslov.htm", PANEL).await;
    mount_page(server, "/2025-3459/ocj_2010.htm", MARKINGS).await;
    mount_page(server, "/2025-3459/rez_2010.htm", NAMES).await;
}

fn read_json(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path).expect("Failed to read result file");
    serde_json::from_str(&content).expect("Result file is not valid JSON")
}

#[tokio::test]
async fn test_fetcher_retries_server_errors() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    Mock::given(method("GET"))
        .and(path("/busy.htm"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&config).unwrap();
    let url = Url::parse(&format!("{}/busy.htm", server.uri())).unwrap();

    match fetcher.fetch_with_retry(&url).await {
        FetchOutcome::Failed(error) => assert!(error.is_transient()),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetcher_does_not_retry_missing_or_forbidden() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    Mock::given(method("GET"))
        .and(path("/missing.htm"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forbidden.htm"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&config).unwrap();
    let missing = Url::parse(&format!("{}/missing.htm", server.uri())).unwrap();
    let forbidden = Url::parse(&format!("{}/forbidden.htm", server.uri())).unwrap();

    assert!(fetcher.fetch_with_retry(&missing).await.is_not_found());
    assert!(matches!(
        fetcher.fetch_with_retry(&forbidden).await,
        FetchOutcome::Failed(open_markings::FetchError::ClientError(403))
    ));
}

#[tokio::test]
async fn test_fetcher_retries_rate_limiting() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    Mock::given(method("GET"))
        .and(path("/slow-down.htm"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&config).unwrap();
    let url = Url::parse(&format!("{}/slow-down.htm", server.uri())).unwrap();

    assert_eq!(
        fetcher.fetch_with_retry(&url).await,
        FetchOutcome::Failed(open_markings::FetchError::RateLimited)
    );
}

#[tokio::test]
async fn test_fetcher_decodes_declared_charset() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    let mut body = b"<html><head><meta charset=\"windows-1250\"></head><body>".to_vec();
    body.extend_from_slice(b"Novak Petra / \xC8esko</body></html>");

    Mock::given(method("GET"))
        .and(path("/rez_2010.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&config).unwrap();
    let url = Url::parse(&format!("{}/rez_2010.htm", server.uri())).unwrap();

    match fetcher.fetch_with_retry(&url).await {
        FetchOutcome::Found(text) => {
            assert!(text.contains("Novak Petra / Česko"));
            assert!(!text.contains('\u{FFFD}'));
        }
        other => panic!("expected a page, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetcher_sends_user_agent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    Mock::given(method("GET"))
        .and(path("/naslov.htm"))
        .and(header("user-agent", config.user_agent.header_value().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(NASLOV))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&config).unwrap();
    let url = Url::parse(&format!("{}/naslov.htm", server.uri())).unwrap();

    assert_eq!(
        fetcher.fetch_with_retry(&url).await,
        FetchOutcome::Found(NASLOV.to_string())
    );
}

#[tokio::test]
async fn test_discovery_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());
    mount_competition(&server).await;

    let filter = Filter::new(YearRange::single(2025)).with_dance("BW");
    let summary = run_harvest(&config, filter).await.unwrap();

    assert_eq!(summary.competitions_probed, 5);
    assert_eq!(summary.competitions_found, 1);
    assert_eq!(summary.rounds_found, 1);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.written, 1);
    assert!(summary.errors.is_empty());

    let json = read_json(&dir.path().join(FINAL_FILE));
    let info = &json["competition_info"];
    assert_eq!(info["location"], "Geneve");
    assert_eq!(info["date"], "06.09.2025");
    assert_eq!(info["round"], "Final");
    assert_eq!(info["dance"], "Boogie Woogie");
    assert_eq!(info["class"], "Main Class");
    assert_eq!(info["judges"].as_array().unwrap().len(), 3);
    assert_eq!(info["judges"][0]["letter"], "A");
    assert!(info.get("heat").is_none());

    let couples = json["couples"].as_array().unwrap();
    assert_eq!(couples.len(), 3);
    assert_eq!(couples[0]["start_number"], "112");
    assert_eq!(couples[0]["competitor_names"], "Tom MEIER & Lea KELLER");
    assert_eq!(couples[0]["categories"]["BBW"]["aggregated"], "3,75");
}

#[tokio::test]
async fn test_discovery_rejects_other_dances() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());
    mount_competition(&server).await;

    let filter = Filter::new(YearRange::single(2025)).with_dance("Tango");
    let summary = run_harvest(&config, filter).await.unwrap();

    assert_eq!(summary.rounds_found, 1);
    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.written, 0);
    assert!(!dir.path().join(FINAL_FILE).exists());
}

#[tokio::test]
async fn test_discovery_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    mount_competition(&server).await;

    let filter = Filter::new(YearRange::single(2025));
    let first = run_harvest(&config, filter.clone()).await.unwrap();
    let first_content = fs::read_to_string(dir.path().join(FINAL_FILE)).unwrap();

    config.scraper.workers = 1;
    let second = run_harvest(&config, filter).await.unwrap();
    let second_content = fs::read_to_string(dir.path().join(FINAL_FILE)).unwrap();

    assert_eq!(first.accepted, second.accepted);
    assert_eq!(first.competitions_probed, second.competitions_probed);
    assert_eq!(first_content, second_content);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_server_errors_are_summarized() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());
    mount_competition(&server).await;

    Mock::given(method("GET"))
        .and(path("/2025-3461/naslov.htm"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let summary = run_harvest(&config, Filter::new(YearRange::single(2025)))
        .await
        .unwrap();

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.errored(), 1);
    assert!(summary.errors[0].url.ends_with("/2025-3461/naslov.htm"));
}

#[tokio::test]
async fn test_scrape_urls_split_heats() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.filter.split_heats = true;
    mount_competition(&server).await;
    mount_page(&server, "/2025-3459/ocj_2011.htm", SLOW_FAST).await;

    let urls = vec![
        format!("{}/2025-3459/ocj_2011.htm", server.uri()),
        format!("{}/2025-3459/ocj_2099.htm", server.uri()),
    ];
    let outcomes = scrape_urls(&config, &urls).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_success());
    assert_eq!(outcomes[0].written.len(), 2);
    assert!(!outcomes[1].is_success());

    let slow = read_json(&dir.path().join(
        "results_Geneve_06-09-25_Boogie-Woogie_Main-Class_Final_Slow.json",
    ));
    let fast = read_json(&dir.path().join(
        "results_Geneve_06-09-25_Boogie-Woogie_Main-Class_Final_Fast.json",
    ));
    assert_eq!(slow["competition_info"]["heat"], "Slow");
    assert_eq!(fast["competition_info"]["heat"], "Fast");
    assert_eq!(fast["couples"][0]["sum"], "31,50");
}
