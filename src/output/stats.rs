//! Statistics over a run's results
//!
//! This module provides functionality for summarizing the scraped items and
//! printing the summary at the end of a run.

use crate::catalog::CatalogItem;
use crate::state::{Badge, StockStatus};
use std::collections::BTreeMap;

/// Run statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Total number of parent items
    pub total_items: u64,

    /// Count of items by category badge
    pub items_by_badge: BTreeMap<Badge, u64>,

    /// Count of items by aggregated stock status
    pub items_by_status: BTreeMap<StockStatus, u64>,

    /// Items that carry at least one variation
    pub items_with_variations: u64,

    /// Total number of variations across all items
    pub total_variations: u64,

    /// Variations observed out of stock
    pub out_of_stock_variations: u64,
}

impl RunStatistics {
    /// Computes statistics over a result list
    pub fn from_items(items: &[CatalogItem]) -> Self {
        let mut stats = Self::default();

        for item in items {
            stats.total_items += 1;
            *stats.items_by_badge.entry(item.badge).or_insert(0) += 1;
            *stats.items_by_status.entry(item.stock_status).or_insert(0) += 1;

            if !item.variations.is_empty() {
                stats.items_with_variations += 1;
            }
            stats.total_variations += item.variations.len() as u64;
            stats.out_of_stock_variations += item.out_of_stock_variations().count() as u64;
        }

        stats
    }

    pub fn count_for_status(&self, status: StockStatus) -> u64 {
        self.items_by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    println!("  Total items: {}", stats.total_items);
    println!("  Items with variations: {}", stats.items_with_variations);
    println!(
        "  Variations: {} ({} out of stock)",
        stats.total_variations, stats.out_of_stock_variations
    );
    println!();

    println!("Items by Badge:");
    for (badge, count) in &stats.items_by_badge {
        println!("  {}: {}", badge, count);
    }
    println!();

    println!("Items by Stock Status:");
    // Sort statuses by count (descending)
    let mut status_counts: Vec<_> = stats.items_by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in status_counts {
        let percentage = if stats.total_items > 0 {
            (*count as f64 / stats.total_items as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
}
