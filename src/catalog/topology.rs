//! Variant topologies of a product detail page

use crate::catalog::Variation;
use crate::document::ElementHandle;
use crate::state::StockCounts;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural pattern of the variant controls on a detail page
///
/// Exactly one applies per product. It is chosen from which selectors match,
/// never from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantTopology {
    /// Inline swatches, each carrying its own availability marker
    Simple(Vec<ElementHandle>),

    /// Dropdown options, each pointing at a variant page
    DropdownList(Vec<ElementHandle>),

    /// Swatches whose pages each carry a nested dropdown
    SwatchByDropdown(Vec<ElementHandle>),

    /// Assembly option links marked available or unavailable
    AssemblyOptions(Vec<ElementHandle>),

    /// No variant controls
    None,
}

impl VariantTopology {
    pub fn kind(&self) -> TopologyKind {
        match self {
            Self::Simple(_) => TopologyKind::Simple,
            Self::DropdownList(_) => TopologyKind::DropdownList,
            Self::SwatchByDropdown(_) => TopologyKind::SwatchByDropdown,
            Self::AssemblyOptions(_) => TopologyKind::AssemblyOptions,
            Self::None => TopologyKind::None,
        }
    }

    /// Number of top-level variant elements found on the detail page
    pub fn element_count(&self) -> usize {
        match self {
            Self::Simple(elements)
            | Self::DropdownList(elements)
            | Self::SwatchByDropdown(elements)
            | Self::AssemblyOptions(elements) => elements.len(),
            Self::None => 0,
        }
    }
}

/// Tag of a [`VariantTopology`] without its elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    Simple,
    DropdownList,
    SwatchByDropdown,
    AssemblyOptions,
    None,
}

impl TopologyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::DropdownList => "dropdown_list",
            Self::SwatchByDropdown => "swatch_by_dropdown",
            Self::AssemblyOptions => "assembly_options",
            Self::None => "none",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one product's variants
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub topology: TopologyKind,

    /// Counts over the directly enumerable elements of the topology
    pub counts: StockCounts,

    /// Variant records in discovery order, unique by variant id
    pub variations: Vec<Variation>,
}

impl Resolution {
    /// Resolution of a product without variant controls
    pub fn none() -> Self {
        Self {
            topology: TopologyKind::None,
            counts: StockCounts::default(),
            variations: Vec::new(),
        }
    }

    /// Adds a variation unless one with the same id is already recorded
    ///
    /// Counts are kept separately with [`Resolution::record`]; a duplicate
    /// still counts as an observed element.
    pub fn push_variation(&mut self, variation: Variation) -> bool {
        if self
            .variations
            .iter()
            .any(|existing| existing.variant_id == variation.variant_id)
        {
            return false;
        }
        self.variations.push(variation);
        true
    }

    /// Records one counted element
    pub fn record(&mut self, is_out_of_stock: bool) {
        self.counts.record(is_out_of_stock);
    }
}
