//! Configuration module for Open Markings
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All keys are optional; command-line flags may override the filter section.
//!
//! # Example
//!
//! ```no_run
//! use open_markings::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("open-markings.toml")).unwrap();
//! println!("Round gap tolerance: {}", config.discovery.round_gap_tolerance);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DiscoveryConfig, FilterConfig, IdWindow, OutputConfig, ScraperConfig,
    UserAgentConfig, YearWindow,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
