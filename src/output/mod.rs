//! Output module for run summaries and reports
//!
//! This module handles:
//! - Computing statistics over the scraped items
//! - Generating the markdown stock report

mod markdown;
pub mod stats;

pub use markdown::{format_stock_report, write_stock_report};
pub use stats::{print_statistics, RunStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
