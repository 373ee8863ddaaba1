//! Scrape orchestrator - end-to-end run logic
//!
//! This module composes the crawler components into a complete run:
//! - acquiring one document per role and releasing them on every exit path
//! - walking each category's listing pages in order
//! - processing every item with item-level retry
//! - checkpointing after each item and resuming from a checkpoint
//! - throttling after every item and page transition

use crate::catalog::{CatalogItem, ItemContext, ListingStub, SelectorSet};
use crate::config::{CategoryConfig, Config};
use crate::crawler::{
    CatalogPaginator, ItemLister, NavigationOutcome, RetryPolicy, ScrapeEvent, ScrapeObserver,
    Throttle, TracingObserver, VariationResolver,
};
use crate::document::{Browser, DocumentPool, DocumentRole, NavigateOptions};
use crate::state::RunState;
use crate::storage::{CheckpointStore, ResultSet, ScrapeCheckpoint};
use crate::{ErrorClass, Result, ScrapeError};
use std::sync::Arc;

/// Whether a run continues from existing checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Continue each category from its checkpoint, if it has one
    Resume,

    /// Delete checkpoints and results, then start every category at page 0
    Fresh,
}

/// Main scrape orchestration structure
///
/// Each category runs through its own [`RunState`] machine; the orchestrator
/// ends in `Terminated` once documents are released.
pub struct ScrapeOrchestrator<B: Browser> {
    browser: B,
    config: Config,
    selectors: SelectorSet,
    observer: Arc<dyn ScrapeObserver>,
    state: RunState,
}

impl<B: Browser> ScrapeOrchestrator<B> {
    /// Creates an orchestrator that logs through `tracing`
    pub fn new(browser: B, config: Config) -> Self {
        let selectors = config.selector_set();
        Self {
            browser,
            config,
            selectors,
            observer: Arc::new(TracingObserver),
            state: RunState::Idle,
        }
    }

    /// Replaces the event observer
    pub fn with_observer(mut self, observer: Arc<dyn ScrapeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checkpoint store of one category
    pub fn store_for(&self, category: &CategoryConfig) -> CheckpointStore {
        CheckpointStore::for_category(&self.config.output, category.badge)
    }

    /// True if any category has a checkpoint to resume from
    pub fn has_checkpoint(&self) -> bool {
        self.config
            .catalog
            .categories
            .iter()
            .any(|category| self.store_for(category).exists())
    }

    /// Runs every category and returns the combined, de-duplicated results
    ///
    /// Documents and the browser are released before returning, whether the
    /// run succeeded or failed.
    pub async fn run(&mut self, mode: StartMode) -> Result<Vec<CatalogItem>> {
        tracing::info!(
            "Starting {} scrape of {} ({} categories)",
            match mode {
                StartMode::Resume => "resumed",
                StartMode::Fresh => "fresh",
            },
            self.config.catalog.display_name(),
            self.config.catalog.categories.len()
        );

        let mut pool = match DocumentPool::acquire(&self.browser).await {
            Ok(pool) => pool,
            Err(e) => {
                self.teardown(None).await;
                return Err(self.fail(e.into()));
            }
        };

        let result = self.run_categories(&mut pool, mode).await;
        self.teardown(Some(pool)).await;

        match result {
            Ok(items) => {
                self.transition(RunState::Terminated)?;
                tracing::info!("Scrape completed: {} items", items.len());
                Ok(items)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run_categories(
        &mut self,
        pool: &mut DocumentPool<B::Document>,
        mode: StartMode,
    ) -> Result<Vec<CatalogItem>> {
        let categories = self.config.catalog.categories.clone();
        let mut combined = ResultSet::new();

        for category in &categories {
            let results = self.scrape_category(pool, category, mode).await?;
            combined.extend(results.into_items());
        }

        Ok(combined.into_items())
    }

    /// Scrapes one category from its start point to its last page
    async fn scrape_category(
        &mut self,
        pool: &mut DocumentPool<B::Document>,
        category: &CategoryConfig,
        mode: StartMode,
    ) -> Result<ResultSet> {
        self.state = RunState::Idle;
        let store = self.store_for(category);
        self.observer.on_event(&ScrapeEvent::CategoryStarted {
            badge: category.badge,
            url: category.url.clone(),
        });

        let checkpoint = match mode {
            StartMode::Resume => store.load()?,
            StartMode::Fresh => {
                store.clear()?;
                None
            }
        };

        let (mut page_index, mut start_position, mut results) = match checkpoint {
            Some(checkpoint) => {
                self.transition(RunState::Resuming)?;
                let results = ResultSet::from_items(store.load_results()?);
                self.observer.on_event(&ScrapeEvent::Resumed {
                    badge: category.badge,
                    page_index: checkpoint.last_page_scraped,
                    position: checkpoint.last_position_scraped,
                    items: results.len(),
                });
                (
                    checkpoint.last_page_scraped,
                    checkpoint.last_position_scraped as usize,
                    results,
                )
            }
            None => {
                self.transition(RunState::Starting)?;
                (0, 0, ResultSet::new())
            }
        };

        // Cloned: `transition` borrows self mutably while these are alive
        let scraper = self.config.scraper.clone();
        let testing = self.config.testing.clone();
        let selectors = self.selectors.clone();
        let throttle = Throttle::from_config(&scraper);
        let paginator = CatalogPaginator::new(&selectors, &scraper);
        let lister = ItemLister::new(self.config.catalog.family, &selectors, &scraper, &testing);
        let page_cap = testing.page_cap();

        self.transition(RunState::PageLoop)?;
        let mut page = paginator
            .open(
                pool.get_mut(DocumentRole::Main),
                &category.url,
                page_index,
                self.observer.as_ref(),
            )
            .await?;

        loop {
            let stubs = lister
                .list(pool.get(DocumentRole::Main), self.observer.as_ref())
                .await?;
            self.observer.on_event(&ScrapeEvent::ItemsListed {
                page_index,
                count: stubs.len(),
            });

            self.transition(RunState::ItemLoop)?;
            let context = ItemContext {
                page_number: page_index + 1,
                badge: category.badge,
                inherited: category.stock_status,
            };

            // Only the first page of a resumed category starts mid-page
            for (index, stub) in stubs.iter().enumerate().skip(start_position) {
                if self.state == RunState::Checkpointed {
                    self.transition(RunState::ItemLoop)?;
                }

                let item = self.process_item_with_retry(pool, stub, &context).await?;
                results.insert(item);

                let checkpoint = ScrapeCheckpoint {
                    last_page_scraped: page_index,
                    last_position_scraped: index as u32,
                    total_items_scraped: results.len() as u64,
                };
                store.save(&checkpoint, &results)?;
                self.transition(RunState::Checkpointed)?;
                self.observer.on_event(&ScrapeEvent::Checkpointed {
                    page_index,
                    position: checkpoint.last_position_scraped,
                    total_items: checkpoint.total_items_scraped,
                });

                throttle.wait().await;
            }
            start_position = 0;

            let capped = page_cap.is_some_and(|cap| page_index + 1 >= cap);
            let next_page_url = match page.next_page_url.take() {
                Some(url) if !capped => url,
                _ => {
                    if capped {
                        tracing::info!("Page limit reached after page {}", page_index + 1);
                    }
                    self.transition(RunState::Done)?;
                    break;
                }
            };

            self.transition(RunState::NextPage)?;
            throttle.wait().await;
            page_index += 1;

            self.transition(RunState::PageLoop)?;
            page = paginator
                .advance(
                    pool.get_mut(DocumentRole::Main),
                    &next_page_url,
                    page_index,
                    self.observer.as_ref(),
                )
                .await?;
        }

        self.observer.on_event(&ScrapeEvent::CategoryFinished {
            badge: category.badge,
            items: results.len(),
        });
        Ok(results)
    }

    /// Processes one item, retrying the whole item with a fixed delay
    ///
    /// Exhausting the attempts is fatal for the run.
    async fn process_item_with_retry(
        &self,
        pool: &mut DocumentPool<B::Document>,
        stub: &ListingStub,
        context: &ItemContext,
    ) -> Result<CatalogItem> {
        let max_attempts = self.config.scraper.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.process_item(pool, stub, context).await {
                Ok(item) => return Ok(item),
                Err(e) if e.class() == ErrorClass::Fatal => return Err(e),
                Err(e) => e,
            };

            self.observer.on_event(&ScrapeEvent::ItemRetry {
                page_number: context.page_number,
                position: stub.position,
                attempt,
                max_attempts,
                reason: error.to_string(),
            });

            if attempt >= max_attempts {
                return Err(ScrapeError::ItemRetriesExhausted {
                    page_number: context.page_number,
                    position: stub.position,
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            let delay = self.config.scraper.item_retry_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Loads the item's detail page, resolves its variants and builds the item
    async fn process_item(
        &self,
        pool: &mut DocumentPool<B::Document>,
        stub: &ListingStub,
        context: &ItemContext,
    ) -> Result<CatalogItem> {
        let scraper = &self.config.scraper;
        let family = self.config.catalog.family;
        let product_id = family.product_id(&stub.url);
        let docs = pool.variant_documents();

        let outcome = RetryPolicy::from_config(scraper)
            .navigate(
                &mut *docs.detail,
                &stub.url,
                NavigateOptions::new(scraper.navigation_timeout()),
                self.observer.as_ref(),
            )
            .await;
        if let NavigationOutcome::NotNavigated { attempts, reason } = outcome {
            return Err(ScrapeError::NavigationExhausted {
                url: stub.url.clone(),
                attempts,
                reason,
            });
        }

        let resolution = VariationResolver::new(
            family,
            &self.selectors,
            scraper,
            self.observer.as_ref(),
        )
        .resolve(docs, &product_id, context)
        .await?;

        let topology = resolution.topology;
        let item = CatalogItem::from_resolution(stub, product_id, *context, resolution);

        self.observer.on_event(&ScrapeEvent::ItemScraped {
            page_number: item.page_number,
            position: item.position_on_page,
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            stock_status: item.stock_status,
            topology,
            variations: item.variations.len(),
        });

        Ok(item)
    }

    fn transition(&mut self, next: RunState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        self.observer.on_event(&ScrapeEvent::StateChanged {
            from: self.state,
            to: next,
        });
        self.state = next;
        Ok(())
    }

    /// Records a fatal error and moves to `Terminated`
    fn fail(&mut self, error: ScrapeError) -> ScrapeError {
        self.observer.on_event(&ScrapeEvent::Fatal {
            reason: error.to_string(),
        });
        if self.state != RunState::Terminated {
            self.observer.on_event(&ScrapeEvent::StateChanged {
                from: self.state,
                to: RunState::Terminated,
            });
            self.state = RunState::Terminated;
        }
        error
    }

    /// Closes every document and the browser; failures are only logged
    async fn teardown(&self, pool: Option<DocumentPool<B::Document>>) {
        if let Some(pool) = pool {
            if let Err(e) = pool.release().await {
                tracing::warn!("Failed to release documents: {}", e);
            }
        }
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
    }
}
