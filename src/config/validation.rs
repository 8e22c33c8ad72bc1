use crate::config::types::{
    Config, DiscoveryConfig, FilterConfig, OutputConfig, ScraperConfig, UserAgentConfig,
};
use crate::model::YearRange;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Highest competition ID the four-digit URL scheme can express
const MAX_COMPETITION_ID: u32 = 9999;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_discovery_config(&config.discovery)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_filter_config(&config.filter)?;
    Ok(())
}

/// Validates worker pool and retry configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.request_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be >= 100ms, got {}ms",
            config.request_delay_ms
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 || config.connect_timeout_secs > config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be between 1 and timeout_secs ({}), got {}",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates identifier space configuration
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if config.first_round > config.last_round {
        return Err(ConfigError::Validation(format!(
            "first_round ({}) must not exceed last_round ({})",
            config.first_round, config.last_round
        )));
    }

    if config.round_gap_tolerance < 1 {
        return Err(ConfigError::Validation(
            "round_gap_tolerance must be >= 1".to_string(),
        ));
    }

    if config.competition_gap_tolerance < 1 {
        return Err(ConfigError::Validation(
            "competition_gap_tolerance must be >= 1".to_string(),
        ));
    }

    validate_window(
        "default_window",
        config.default_window.first,
        config.default_window.last,
    )?;

    let mut seen = HashSet::new();
    for window in &config.windows {
        if !seen.insert(window.year) {
            return Err(ConfigError::Validation(format!(
                "duplicate competition window for year {}",
                window.year
            )));
        }
        validate_window(&format!("window {}", window.year), window.first, window.last)?;
    }

    Ok(())
}

/// Validates one competition ID window
fn validate_window(name: &str, first: u32, last: u32) -> Result<(), ConfigError> {
    if first > last {
        return Err(ConfigError::Validation(format!(
            "{}: first ({}) must not exceed last ({})",
            name, first, last
        )));
    }

    if last > MAX_COMPETITION_ID {
        return Err(ConfigError::Validation(format!(
            "{}: competition IDs have four digits, got last = {}",
            name, last
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "results_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates filter configuration
///
/// The year range may be left out here because the command line can supply it.
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if let Some(years) = &config.years {
        years.parse::<YearRange>()?;
    }

    for (abbreviation, expansions) in &config.aliases {
        if abbreviation.trim().is_empty() {
            return Err(ConfigError::Validation(
                "alias abbreviations cannot be empty".to_string(),
            ));
        }

        if expansions.is_empty() || expansions.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "alias '{}' needs at least one non-empty expansion",
                abbreviation
            )));
        }
    }

    Ok(())
}
