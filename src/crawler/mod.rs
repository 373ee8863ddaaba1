//! Crawler module for catalog traversal and stock resolution
//!
//! This module contains the core scraping logic, including:
//! - navigation with bounded exponential backoff
//! - listing pagination and product stub extraction
//! - variant topology resolution
//! - randomized throttling between requests
//! - overall run orchestration with checkpointing

pub(crate) mod events;
mod lister;
mod orchestrator;
mod paginator;
mod retry;
mod throttle;
mod variations;

pub use events::{ScrapeEvent, ScrapeObserver, TracingObserver};
pub use lister::ItemLister;
pub use orchestrator::{ScrapeOrchestrator, StartMode};
pub use paginator::{CatalogPaginator, ListingPage};
pub use retry::{NavigationOutcome, RetryPolicy};
pub use throttle::Throttle;
pub use variations::VariationResolver;
