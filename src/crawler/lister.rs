//! Product stub extraction from listing pages

use crate::catalog::{CatalogFamily, ListingStub, SelectorSet};
use crate::config::{ScraperConfig, TestingConfig};
use crate::crawler::{ScrapeEvent, ScrapeObserver};
use crate::document::{Document, ElementHandle, Scope};
use crate::{ErrorClass, Result, ScrapeError};
use std::time::Duration;

/// Whole-batch attempts at reading a listing page
const LISTING_ATTEMPTS: u32 = 3;

/// Reads the ordered product stubs of a loaded listing page
///
/// The whole batch is retried with a fixed delay. A stub that cannot be read
/// inside an otherwise successful attempt is dropped unless the error is fatal.
pub struct ItemLister<'a> {
    family: CatalogFamily,
    selectors: &'a SelectorSet,
    retry_delay: Duration,
    max_items: Option<usize>,
}

impl<'a> ItemLister<'a> {
    pub fn new(
        family: CatalogFamily,
        selectors: &'a SelectorSet,
        config: &ScraperConfig,
        testing: &TestingConfig,
    ) -> Self {
        Self {
            family,
            selectors,
            retry_delay: config.listing_retry_delay(),
            max_items: testing.item_cap(),
        }
    }

    /// Keeps at most `max_items` stubs per page
    pub fn with_max_items(mut self, max_items: Option<usize>) -> Self {
        self.max_items = max_items;
        self
    }

    /// Returns the page's stubs in page order, positions starting at 1
    pub async fn list<D: Document + ?Sized>(
        &self,
        doc: &D,
        observer: &dyn ScrapeObserver,
    ) -> Result<Vec<ListingStub>> {
        let mut last_error = String::new();

        for attempt in 1..=LISTING_ATTEMPTS {
            match self.extract(doc, observer).await {
                Ok(stubs) => return Ok(stubs),
                Err(e) => {
                    observer.on_event(&ScrapeEvent::ListingRetry {
                        attempt,
                        max_attempts: LISTING_ATTEMPTS,
                        reason: e.to_string(),
                    });
                    last_error = e.to_string();
                }
            }

            if attempt < LISTING_ATTEMPTS && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(ScrapeError::ListingUnavailable {
            attempts: LISTING_ATTEMPTS,
            reason: last_error,
        })
    }

    async fn extract<D: Document + ?Sized>(
        &self,
        doc: &D,
        observer: &dyn ScrapeObserver,
    ) -> Result<Vec<ListingStub>> {
        let mut elements = doc
            .query_selector_all(Scope::Document, &self.selectors.items)
            .await?;

        if let Some(cap) = self.max_items {
            elements.truncate(cap);
        }

        let mut stubs = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let position = index as u32 + 1;

            match self.read_stub(doc, element, position).await {
                Ok(stub) => stubs.push(stub),
                Err(e) if e.class() != ErrorClass::Fatal => {
                    observer.on_event(&ScrapeEvent::StubDropped {
                        position,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(stubs)
    }

    async fn read_stub<D: Document + ?Sized>(
        &self,
        doc: &D,
        element: &ElementHandle,
        position: u32,
    ) -> Result<ListingStub> {
        let url = doc
            .query_selector(Scope::Element(element), &self.selectors.item_link)
            .await?
            .and_then(|link| link.href())
            .ok_or_else(|| ScrapeError::Extraction {
                what: "item link".to_string(),
                reason: format!("no usable {} at position {}", self.selectors.item_link, position),
            })?;

        let title = self.family.parse_title(doc, element, self.selectors).await?;
        let has_variations = self
            .family
            .detect_variations(doc, element, self.selectors)
            .await?;

        Ok(ListingStub {
            url: url.to_string(),
            title,
            has_variations,
            position,
        })
    }
}
