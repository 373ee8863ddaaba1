//! Storage module for persisting scrape progress
//!
//! This module handles the files a run writes while it works:
//! - the checkpoint recording the last processed page and position
//! - the accumulated results, de-duplicated by `(productId, sourceUrl)`
//!
//! Both are JSON files, rewritten atomically after every processed item so an
//! interrupted run can resume without data loss.

mod checkpoint;
mod results;

pub use checkpoint::{CheckpointStore, ScrapeCheckpoint};
pub use results::ResultSet;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error in {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
