//! De-duplicated result accumulation

use crate::catalog::CatalogItem;
use std::collections::HashMap;

/// Ordered collection of items, unique by `(productId, sourceUrl)`
///
/// Re-inserting a known item replaces the stored record in place, so the
/// latest observation wins while the original order is kept.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    items: Vec<CatalogItem>,
    index: HashMap<(String, String), usize>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from previously saved items, dropping duplicates
    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut set = Self::new();
        set.extend(items);
        set
    }

    /// Adds an item; returns false if it replaced an existing record
    pub fn insert(&mut self, item: CatalogItem) -> bool {
        let key = (item.product_id.clone(), item.source_url.clone());

        match self.index.get(&key) {
            Some(&pos) => {
                self.items[pos] = item;
                false
            }
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(item);
                true
            }
        }
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = CatalogItem>) {
        for item in items {
            self.insert(item);
        }
    }

    pub fn contains(&self, product_id: &str, source_url: &str) -> bool {
        self.index
            .contains_key(&(product_id.to_string(), source_url.to_string()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CatalogItem> {
        self.items
    }
}
