//! Listing page navigation

use crate::catalog::SelectorSet;
use crate::config::ScraperConfig;
use crate::crawler::{NavigationOutcome, RetryPolicy, ScrapeEvent, ScrapeObserver};
use crate::document::{Document, NavigateOptions, Scope};
use crate::{Result, ScrapeError};
use std::time::Duration;
use url::Url;

/// What a loaded listing page reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// 0-based page index
    pub page_index: u32,

    pub url: Url,
    pub title: String,
    pub has_next_page: bool,

    /// Resolved href of the "next" link, when there is a next page
    pub next_page_url: Option<Url>,
}

/// Drives the main document through a category's listing pages
pub struct CatalogPaginator<'a> {
    selectors: &'a SelectorSet,
    retry: RetryPolicy,
    grid_timeout: Duration,
    page_timeout: Duration,
}

impl<'a> CatalogPaginator<'a> {
    pub fn new(selectors: &'a SelectorSet, config: &ScraperConfig) -> Self {
        Self {
            selectors,
            retry: RetryPolicy::from_config(config),
            grid_timeout: config.grid_timeout(),
            page_timeout: config.page_timeout(),
        }
    }

    /// Loads listing page `page_index` of the category at `base_url`
    pub async fn open<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        base_url: &str,
        page_index: u32,
        observer: &dyn ScrapeObserver,
    ) -> Result<ListingPage> {
        let url = crate::url::listing_page_url(base_url, page_index);
        self.load(doc, &url, NavigateOptions::new(self.page_timeout), page_index, observer)
            .await
    }

    /// Follows the "next" link of the current page
    pub async fn advance<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        next_page_url: &Url,
        page_index: u32,
        observer: &dyn ScrapeObserver,
    ) -> Result<ListingPage> {
        self.load(
            doc,
            next_page_url.as_str(),
            NavigateOptions::dom_content_loaded(self.page_timeout),
            page_index,
            observer,
        )
        .await
    }

    async fn load<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        url: &str,
        options: NavigateOptions,
        page_index: u32,
        observer: &dyn ScrapeObserver,
    ) -> Result<ListingPage> {
        if let NavigationOutcome::NotNavigated { reason, .. } =
            self.retry.navigate(doc, url, options, observer).await
        {
            return Err(ScrapeError::GridNotLoaded {
                url: url.to_string(),
                reason,
            });
        }

        let page = self.inspect(doc, page_index).await?;
        observer.on_event(&ScrapeEvent::PageLoaded {
            page_index,
            url: page.url.to_string(),
            title: page.title.clone(),
            has_next_page: page.has_next_page,
        });
        Ok(page)
    }

    /// Waits for the grid and reads pagination state of the loaded page
    ///
    /// A grid that does not appear within the timeout is fatal.
    pub async fn inspect<D: Document + ?Sized>(
        &self,
        doc: &D,
        page_index: u32,
    ) -> Result<ListingPage> {
        let url = doc.current_url().cloned().ok_or_else(|| ScrapeError::GridNotLoaded {
            url: String::new(),
            reason: "no page loaded".to_string(),
        })?;

        doc.wait_for_selector(Scope::Document, &self.selectors.product_grid, self.grid_timeout)
            .await
            .map_err(|e| ScrapeError::GridNotLoaded {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let disabled = doc
            .query_selector(Scope::Document, &self.selectors.next_page_disabled)
            .await?
            .is_some();

        let next_page_url = if disabled {
            None
        } else {
            doc.query_selector(Scope::Document, &self.selectors.next_page_link)
                .await?
                .and_then(|link| link.href())
        };

        let title = doc
            .evaluate(Scope::Document, "document.title")
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(ListingPage {
            page_index,
            url,
            title,
            has_next_page: next_page_url.is_some(),
            next_page_url,
        })
    }
}
