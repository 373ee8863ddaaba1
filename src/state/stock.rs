//! Stock status, category badges, and the parent-verdict aggregator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability verdict for an item or a variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,

    #[serde(rename = "Partially Out of Stock")]
    PartiallyOutOfStock,

    #[serde(rename = "Out of Stock")]
    OutOfStock,

    /// Category-specific status for items listed under the Coming Soon badge
    #[serde(rename = "Coming Soon")]
    ComingSoon,
}

impl StockStatus {
    /// Returns the human-readable label used in reports and result files
    pub fn label(&self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::PartiallyOutOfStock => "Partially Out of Stock",
            Self::OutOfStock => "Out of Stock",
            Self::ComingSoon => "Coming Soon",
        }
    }

    /// Status recorded for a single variation given its availability flag
    ///
    /// Available variations inherit the parent's category status.
    pub fn for_variation(is_out_of_stock: bool, inherited: StockStatus) -> Self {
        if is_out_of_stock {
            Self::OutOfStock
        } else {
            inherited
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category label assigned by the listing query that produced an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "New")]
    New,

    #[serde(rename = "Coming Soon")]
    ComingSoon,

    #[serde(rename = "Clearance")]
    Clearance,

    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::ComingSoon => "Coming Soon",
            Self::Clearance => "Clearance",
            Self::OutOfStock => "Out of Stock",
        }
    }

    /// File-name friendly form of the badge
    pub fn slug(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::ComingSoon => "coming_soon",
            Self::Clearance => "clearance",
            Self::OutOfStock => "out_of_stock",
        }
    }

    pub fn all() -> [Badge; 4] {
        [Self::New, Self::ComingSoon, Self::Clearance, Self::OutOfStock]
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Counts over the directly enumerable variant elements of one topology
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockCounts {
    pub total: usize,
    pub out_of_stock: usize,
}

impl StockCounts {
    /// Records one observed element
    pub fn record(&mut self, is_out_of_stock: bool) {
        self.total += 1;
        if is_out_of_stock {
            self.out_of_stock += 1;
        }
    }
}

/// Reduces variant counts into the parent's verdict
///
/// - every counted element out of stock (and at least one counted) → `OutOfStock`
/// - anything else counted, including nothing out of stock → `PartiallyOutOfStock`
/// - nothing counted → the inherited category status
pub fn aggregate(counts: StockCounts, inherited: StockStatus) -> StockStatus {
    if counts.total == 0 {
        inherited
    } else if counts.out_of_stock >= counts.total {
        StockStatus::OutOfStock
    } else {
        StockStatus::PartiallyOutOfStock
    }
}
