//! Stockwatch: a catalog stock tracker
//!
//! This crate walks paginated e-commerce catalogs, resolves every product's
//! variant topology, and reduces the observed variant availability into a
//! single stock-status verdict per product. Runs are checkpointed after every
//! item so an interrupted crawl can resume without losing data.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod document;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// How a failure should be handled by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient: retry the operation (timeouts, non-2xx, missing handles)
    Retryable,

    /// Structural: drop the element and keep going
    Skippable,

    /// Abort the run (after tearing down documents)
    Fatal,
}

/// Main error type for Stockwatch operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] document::DocumentError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Product grid did not load for {url}: {reason}")]
    GridNotLoaded { url: String, reason: String },

    #[error("Navigation to {url} failed after {attempts} attempts: {reason}")]
    NavigationExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Listing items could not be read after {attempts} attempts: {reason}")]
    ListingUnavailable { attempts: u32, reason: String },

    #[error("Item at position {position} on page {page_number} failed after {attempts} attempts: {source}")]
    ItemRetriesExhausted {
        page_number: u32,
        position: u32,
        attempts: u32,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("Failed to extract {what}: {reason}")]
    Extraction { what: String, reason: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Classifies this error for the retry/skip/abort decision
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Document(e) => e.class(),
            Self::NavigationExhausted { .. } => ErrorClass::Retryable,
            Self::Extraction { .. } | Self::UrlParse(_) => ErrorClass::Skippable,
            Self::Config(_)
            | Self::Storage(_)
            | Self::GridNotLoaded { .. }
            | Self::ListingUnavailable { .. }
            | Self::ItemRetriesExhausted { .. }
            | Self::InvalidTransition { .. }
            | Self::Io(_) => ErrorClass::Fatal,
        }
    }

    /// Returns true if the failed operation may be attempted again
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Stockwatch operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{CatalogFamily, CatalogItem, SelectorSet, Variation};
pub use config::Config;
pub use crawler::{ScrapeOrchestrator, StartMode};
pub use state::{Badge, RunState, StockStatus};
