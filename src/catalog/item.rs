//! Scraped catalog records

use crate::catalog::Resolution;
use crate::state::{aggregate, Badge, StockStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product as seen on a listing page, before its detail page is visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingStub {
    /// Absolute product URL
    pub url: String,

    pub title: String,

    /// Whether the listing shows variant swatches for this product
    pub has_variations: bool,

    /// 1-indexed position on the listing page
    pub position: u32,
}

/// One variant of a catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub name: String,
    pub variant_id: String,

    /// Product id of the owning item
    pub parent_id: String,

    pub is_out_of_stock: bool,
    pub stock_status: StockStatus,

    /// Inherited from the parent
    pub badge: Badge,
}

/// A fully processed product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: String,
    pub product_id: String,
    pub source_url: String,
    pub page_number: u32,
    pub position_on_page: u32,
    pub badge: Badge,
    pub stock_status: StockStatus,
    pub has_variations: bool,
    pub variations: Vec<Variation>,
    pub retrieved_at: DateTime<Utc>,
}

/// Where an item was found and which category it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemContext {
    pub page_number: u32,
    pub badge: Badge,

    /// Status of the category the item was listed under
    pub inherited: StockStatus,
}

impl CatalogItem {
    /// Builds the finished item from its listing stub and resolved variants
    ///
    /// This is the only place an item's stock status is decided. Variation
    /// parent ids are rewritten to the item's product id.
    pub fn from_resolution(
        stub: &ListingStub,
        product_id: String,
        context: ItemContext,
        resolution: Resolution,
    ) -> Self {
        let stock_status = aggregate(resolution.counts, context.inherited);

        let variations = resolution
            .variations
            .into_iter()
            .map(|variation| Variation {
                parent_id: product_id.clone(),
                badge: context.badge,
                ..variation
            })
            .collect();

        Self {
            name: stub.title.clone(),
            product_id,
            source_url: stub.url.clone(),
            page_number: context.page_number,
            position_on_page: stub.position,
            badge: context.badge,
            stock_status,
            has_variations: stub.has_variations,
            variations,
            retrieved_at: Utc::now(),
        }
    }

    /// Key used to de-duplicate results
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.product_id, &self.source_url)
    }

    pub fn out_of_stock_variations(&self) -> impl Iterator<Item = &Variation> {
        self.variations.iter().filter(|v| v.is_out_of_stock)
    }
}
