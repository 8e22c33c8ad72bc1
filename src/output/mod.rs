//! Output module for writing records and run summaries
//!
//! This module handles:
//! - Writing accepted records as JSON files with deterministic names
//! - Recording run statistics and per-task errors
//! - Printing the end-of-run summary

pub mod stats;
mod writer;

pub use stats::{print_summary, RunSummary, TaskError};
pub use writer::{file_name, format_date_for_filename, sanitize_component, JsonWriter};

use std::path::PathBuf;
use thiserror::Error;

/// Record writer errors
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}
