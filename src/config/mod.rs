//! Configuration module for Stockwatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use stockwatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("stockwatch.toml")).unwrap();
//! println!("Scraping {} categories", config.catalog.categories.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, CatalogConfig, CategoryConfig, Config, OutputConfig, ScraperConfig,
    SelectorOverrides, TestingConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
