use crate::catalog::{CatalogFamily, SelectorSet};
use crate::state::{Badge, StockStatus};
use serde::Deserialize;
use std::time::Duration;

/// User agent presented to the catalog sites
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Stockwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub testing: TestingConfig,

    pub catalog: CatalogConfig,

    /// Overrides applied on top of the family's built-in selectors
    #[serde(default)]
    pub selectors: SelectorOverrides,
}

impl Config {
    /// The selector set a run uses: family defaults plus overrides
    pub fn selector_set(&self) -> SelectorSet {
        self.catalog
            .family
            .default_selectors()
            .with_overrides(&self.selectors)
    }
}

/// Timing and retry behaviour of a scrape
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Base of the randomized delay after every item and page (milliseconds)
    pub throttle_delay_ms: u64,

    /// Upper bound of the uniform jitter added to the throttle (milliseconds)
    pub throttle_jitter_ms: u64,

    /// Wait before reading lazily updated swatch markers (milliseconds)
    pub settle_delay_ms: u64,

    /// Attempts per navigation and per item
    pub max_attempts: u32,

    /// Unit of the exponential navigation backoff (milliseconds)
    pub backoff_base_ms: u64,

    /// Fixed delay between listing extraction attempts (milliseconds)
    pub listing_retry_delay_ms: u64,

    /// Fixed delay between attempts at processing one item (milliseconds)
    pub item_retry_delay_ms: u64,

    /// How long to wait for the listing grid (milliseconds)
    pub grid_timeout_ms: u64,

    /// Timeout of item and variant navigations (milliseconds)
    pub navigation_timeout_ms: u64,

    /// Timeout of listing page navigations (milliseconds)
    pub page_timeout_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            throttle_delay_ms: 1000,
            throttle_jitter_ms: 1000,
            settle_delay_ms: 2000,
            max_attempts: 3,
            backoff_base_ms: 1000,
            listing_retry_delay_ms: 2000,
            item_retry_delay_ms: 2000,
            grid_timeout_ms: 60_000,
            navigation_timeout_ms: 60_000,
            page_timeout_ms: 160_000,
        }
    }
}

impl ScraperConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn listing_retry_delay(&self) -> Duration {
        Duration::from_millis(self.listing_retry_delay_ms)
    }

    pub fn item_retry_delay(&self) -> Duration {
        Duration::from_millis(self.item_retry_delay_ms)
    }

    pub fn grid_timeout(&self) -> Duration {
        Duration::from_millis(self.grid_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    /// Settings with every delay removed, for tests
    pub fn without_delays() -> Self {
        Self {
            throttle_delay_ms: 0,
            throttle_jitter_ms: 0,
            settle_delay_ms: 0,
            backoff_base_ms: 0,
            listing_retry_delay_ms: 0,
            item_retry_delay_ms: 0,
            grid_timeout_ms: 1000,
            navigation_timeout_ms: 5000,
            page_timeout_ms: 5000,
            ..Self::default()
        }
    }
}

/// HTTP client settings of the document backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub user_agent: String,

    /// Per-request timeout of the HTTP client (milliseconds)
    pub request_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_ms: 160_000,
        }
    }
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Checkpoint file; one per category, suffixed with the badge
    pub checkpoint_path: String,

    /// Accumulated results file; one per category, suffixed with the badge
    pub results_path: String,

    /// Path to the markdown stock report
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: "./checkpoint.json".to_string(),
            results_path: "./results.json".to_string(),
            report_path: "./stock_report.md".to_string(),
        }
    }
}

/// Bounded runs for trying a configuration out
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TestingConfig {
    pub enabled: bool,

    /// Stubs kept per listing page
    pub items_per_page: usize,

    /// Listing pages visited per category
    pub max_pages: u32,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            items_per_page: 3,
            max_pages: 2,
        }
    }
}

impl TestingConfig {
    /// Cap on stubs per page, if the run is bounded
    pub fn item_cap(&self) -> Option<usize> {
        self.enabled.then_some(self.items_per_page)
    }

    /// Cap on pages per category, if the run is bounded
    pub fn page_cap(&self) -> Option<u32> {
        self.enabled.then_some(self.max_pages)
    }
}

/// The catalog to scrape
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub family: CatalogFamily,

    /// Display name used in logs and the report
    #[serde(default)]
    pub name: String,

    /// Categories in processing order
    #[serde(rename = "category")]
    pub categories: Vec<CategoryConfig>,
}

impl CatalogConfig {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.family.as_str()
        } else {
            &self.name
        }
    }
}

/// One listing query and the labels its items receive
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CategoryConfig {
    /// Base listing URL (page parameters are appended)
    pub url: String,

    pub badge: Badge,

    /// Status items inherit when they have no variants
    pub stock_status: StockStatus,
}

/// Per-field selector overrides
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorOverrides {
    pub product_grid: Option<String>,
    pub next_page_disabled: Option<String>,
    pub next_page_link: Option<String>,
    pub items: Option<String>,
    pub item_link: Option<String>,
    pub item_title: Option<String>,
    pub item_variations: Option<String>,
    pub product_details: Option<String>,
    pub swatches: Option<String>,
    pub swatch_unavailable: Option<String>,
    pub swatch_name: Option<String>,
    pub swatch_link: Option<String>,
    pub variant_select: Option<String>,
    pub variant_options: Option<String>,
    pub out_of_stock_marker: Option<String>,
    pub assembly_links: Option<String>,
    pub assembly_unavailable: Option<String>,
    pub product_name: Option<String>,
    pub placeholder_labels: Option<Vec<String>>,
}

impl SelectorOverrides {
    /// Every overridden selector string, keyed by its config name
    pub fn selectors(&self) -> Vec<(&'static str, &str)> {
        [
            ("product-grid", &self.product_grid),
            ("next-page-disabled", &self.next_page_disabled),
            ("next-page-link", &self.next_page_link),
            ("items", &self.items),
            ("item-link", &self.item_link),
            ("item-title", &self.item_title),
            ("item-variations", &self.item_variations),
            ("product-details", &self.product_details),
            ("swatches", &self.swatches),
            ("swatch-name", &self.swatch_name),
            ("swatch-link", &self.swatch_link),
            ("variant-select", &self.variant_select),
            ("variant-options", &self.variant_options),
            ("out-of-stock-marker", &self.out_of_stock_marker),
            ("assembly-links", &self.assembly_links),
            ("product-name", &self.product_name),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}
