//! Structured scrape events
//!
//! Crawler components report progress, retries and failures as
//! [`ScrapeEvent`]s to an injected [`ScrapeObserver`] instead of logging
//! directly. [`TracingObserver`] forwards them to `tracing`.

use crate::catalog::TopologyKind;
use crate::state::{Badge, RunState, StockStatus};
use std::time::Duration;

/// Something that happened during a run
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    StateChanged {
        from: RunState,
        to: RunState,
    },

    CategoryStarted {
        badge: Badge,
        url: String,
    },

    Resumed {
        badge: Badge,
        page_index: u32,
        position: u32,
        items: usize,
    },

    PageLoaded {
        page_index: u32,
        url: String,
        title: String,
        has_next_page: bool,
    },

    ItemsListed {
        page_index: u32,
        count: usize,
    },

    /// A whole listing extraction attempt failed
    ListingRetry {
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },

    /// A single stub could not be read and was left out
    StubDropped {
        position: u32,
        reason: String,
    },

    NavigationRetry {
        url: String,
        attempt: u32,
        max_attempts: u32,
        reason: String,

        /// Backoff before the next attempt; None after the final attempt
        next_delay: Option<Duration>,
    },

    /// Navigation attempts exhausted; the caller continues without the page
    NavigationFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// A variant's data could not be read and is not counted
    VariantSkipped {
        product_id: String,
        variant: String,
        reason: String,
    },

    ItemRetry {
        page_number: u32,
        position: u32,
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },

    ItemScraped {
        page_number: u32,
        position: u32,
        product_id: String,
        name: String,
        stock_status: StockStatus,
        topology: TopologyKind,
        variations: usize,
    },

    Checkpointed {
        page_index: u32,
        position: u32,
        total_items: u64,
    },

    CategoryFinished {
        badge: Badge,
        items: usize,
    },

    Fatal {
        reason: String,
    },
}

/// Receives scrape events
pub trait ScrapeObserver: Send + Sync {
    fn on_event(&self, event: &ScrapeEvent);
}

/// Observer that logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ScrapeObserver for TracingObserver {
    fn on_event(&self, event: &ScrapeEvent) {
        match event {
            ScrapeEvent::StateChanged { from, to } => {
                tracing::trace!("State {} -> {}", from, to);
            }
            ScrapeEvent::CategoryStarted { badge, url } => {
                tracing::info!("Scraping category {} from {}", badge, url);
            }
            ScrapeEvent::Resumed {
                badge,
                page_index,
                position,
                items,
            } => {
                tracing::info!(
                    "Resuming {} at page {}, position {} with {} saved items",
                    badge,
                    page_index + 1,
                    position,
                    items
                );
            }
            ScrapeEvent::PageLoaded {
                page_index,
                url,
                title,
                has_next_page,
            } => {
                tracing::info!(
                    "Page {} loaded: {} ({}){}",
                    page_index + 1,
                    title,
                    url,
                    if *has_next_page { "" } else { ", last page" }
                );
            }
            ScrapeEvent::ItemsListed { page_index, count } => {
                tracing::info!("Found {} items on page {}", count, page_index + 1);
            }
            ScrapeEvent::ListingRetry {
                attempt,
                max_attempts,
                reason,
            } => {
                tracing::warn!(
                    "Listing extraction attempt {}/{} failed: {}",
                    attempt,
                    max_attempts,
                    reason
                );
            }
            ScrapeEvent::StubDropped { position, reason } => {
                tracing::warn!("Dropped item at position {}: {}", position, reason);
            }
            ScrapeEvent::NavigationRetry {
                url,
                attempt,
                max_attempts,
                reason,
                next_delay,
            } => match next_delay {
                Some(delay) => tracing::warn!(
                    "Navigation to {} failed (attempt {}/{}): {}; retrying in {:?}",
                    url,
                    attempt,
                    max_attempts,
                    reason,
                    delay
                ),
                None => tracing::warn!(
                    "Navigation to {} failed (attempt {}/{}): {}",
                    url,
                    attempt,
                    max_attempts,
                    reason
                ),
            },
            ScrapeEvent::NavigationFailed {
                url,
                attempts,
                reason,
            } => {
                tracing::warn!(
                    "Giving up on {} after {} attempts: {}",
                    url,
                    attempts,
                    reason
                );
            }
            ScrapeEvent::VariantSkipped {
                product_id,
                variant,
                reason,
            } => {
                tracing::warn!(
                    "Skipped variant {} of {}: {}",
                    variant,
                    product_id,
                    reason
                );
            }
            ScrapeEvent::ItemRetry {
                page_number,
                position,
                attempt,
                max_attempts,
                reason,
            } => {
                tracing::warn!(
                    "Item {} on page {} failed (attempt {}/{}): {}",
                    position,
                    page_number,
                    attempt,
                    max_attempts,
                    reason
                );
            }
            ScrapeEvent::ItemScraped {
                page_number,
                position,
                product_id,
                name,
                stock_status,
                topology,
                variations,
            } => {
                tracing::info!(
                    "[{}:{}] {} ({}) - {} [{} with {} variations]",
                    page_number,
                    position,
                    name,
                    product_id,
                    stock_status,
                    topology,
                    variations
                );
            }
            ScrapeEvent::Checkpointed {
                page_index,
                position,
                total_items,
            } => {
                tracing::debug!(
                    "Checkpoint: page {}, position {}, {} items total",
                    page_index,
                    position,
                    total_items
                );
            }
            ScrapeEvent::CategoryFinished { badge, items } => {
                tracing::info!("Finished category {}: {} items", badge, items);
            }
            ScrapeEvent::Fatal { reason } => {
                tracing::error!("Scrape aborted: {}", reason);
            }
        }
    }
}

/// Observer that keeps every event, for assertions in tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    events: std::sync::Mutex<Vec<ScrapeEvent>>,
}

#[cfg(test)]
impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<ScrapeEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ScrapeObserver for RecordingObserver {
    fn on_event(&self, event: &ScrapeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
