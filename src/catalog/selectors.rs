//! Per-catalog selector tables

use crate::config::SelectorOverrides;

/// CSS selectors describing one catalog family's markup
///
/// Supplied when a run is constructed and never changed during it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    // ===== Listing pages =====
    /// Container that signals the listing grid has rendered
    pub product_grid: String,

    /// Present when there is no next page
    pub next_page_disabled: String,

    /// The "next page" link
    pub next_page_link: String,

    /// One match per product stub on a listing page
    pub items: String,

    /// Product link inside a stub
    pub item_link: String,

    /// Title element inside a stub
    pub item_title: String,

    /// Swatch container inside a stub
    pub item_variations: String,

    // ===== Detail pages =====
    /// Container that signals the product details have rendered
    pub product_details: String,

    /// Swatch elements on a detail page
    pub swatches: String,

    /// Unavailable marker of a swatch (a class for DSS, a nested selector for RGS)
    pub swatch_unavailable: String,

    /// Name element inside a swatch (unused when the swatch text is the name)
    pub swatch_name: String,

    /// Element inside a swatch carrying the variant URL
    pub swatch_link: String,

    /// The variant `<select>`
    pub variant_select: String,

    /// Options of the variant `<select>`
    pub variant_options: String,

    /// Present on a product page that is out of stock
    pub out_of_stock_marker: String,

    /// Assembly option links
    pub assembly_links: String,

    /// Class carried by unavailable assembly links
    pub assembly_unavailable: String,

    /// Product name heading on a detail page
    pub product_name: String,

    /// Option labels that are prompts rather than variants
    pub placeholder_labels: Vec<String>,
}

fn default_placeholders() -> Vec<String> {
    vec![
        "Select a Style...".to_string(),
        "Select a Height...".to_string(),
    ]
}

impl SelectorSet {
    /// Selectors for Discount School Supply catalogs
    pub fn dss() -> Self {
        Self {
            product_grid: "div.product-grid".to_string(),
            next_page_disabled: "main div.product-grid div.grid-content div.pagination-bar.top div.pagination-wrap.hidden-sm.hidden-xs ul > li.pagination-next.disabled.img-link".to_string(),
            next_page_link: "main div.product-grid div.grid-content div.pagination-bar.top div.pagination-wrap.hidden-sm.hidden-xs ul > li.pagination-next.img-link > a".to_string(),
            items: "body > main > div.container.main__inner-wrapper > div.product-grid > div.grid-content > div > ul > div.product-item".to_string(),
            item_link: "a".to_string(),
            item_title: "div.details-outer > div > div.details-inner > a > span".to_string(),
            item_variations: "div.details-outer > div > div.colorswatch".to_string(),
            product_details: "div.product-details".to_string(),
            swatches: "body > main > div.container.main__inner-wrapper > div.row.product-details > div.col-sm-6.product-details__left > div > div.js-zoom-target > div.purchase > div.product-option > ul > li".to_string(),
            swatch_unavailable: "opacity".to_string(),
            swatch_name: String::new(),
            swatch_link: "a".to_string(),
            variant_select: "div.product-details select.variant-select".to_string(),
            variant_options: "div.product-details select.variant-select option".to_string(),
            out_of_stock_marker: "div.product-details .stock-status.out-of-stock".to_string(),
            assembly_links: "div.product-details div.assembly-options a.assembly-option".to_string(),
            assembly_unavailable: "unavailable".to_string(),
            product_name: "div.product-details h1.name".to_string(),
            placeholder_labels: default_placeholders(),
        }
    }

    /// Selectors for Really Good Stuff catalogs
    pub fn rgs() -> Self {
        Self {
            product_grid: "div.product-grid".to_string(),
            next_page_disabled: "div.product-grid div.pagination-bar.top ul > li.pagination-next.disabled".to_string(),
            next_page_link: "div.product-grid div.pagination-bar.top ul > li.pagination-next > a".to_string(),
            items: "div.product-grid div.grid-content ul > div.product-item".to_string(),
            item_link: "a".to_string(),
            item_title: "div.details-outer a.name".to_string(),
            item_variations: "div.details-outer > div > div.colorswatch.row".to_string(),
            product_details: "div.product-details".to_string(),
            swatches: "#priority1 > label".to_string(),
            swatch_unavailable: "span.custom-radio-btn.opacity".to_string(),
            swatch_name: "label > span".to_string(),
            swatch_link: "span.variantURL".to_string(),
            variant_select: "div.product-details select.variant-select".to_string(),
            variant_options: "div.product-details select.variant-select option".to_string(),
            out_of_stock_marker: "div.product-details .out-of-stock-msg".to_string(),
            assembly_links: "div.product-details ul.assembly-options a".to_string(),
            assembly_unavailable: "disabled".to_string(),
            product_name: "div.product-details h1.product-name".to_string(),
            placeholder_labels: default_placeholders(),
        }
    }

    /// Returns a copy with every configured override applied
    pub fn with_overrides(mut self, overrides: &SelectorOverrides) -> Self {
        let fields: [(&mut String, &Option<String>); 18] = [
            (&mut self.product_grid, &overrides.product_grid),
            (&mut self.next_page_disabled, &overrides.next_page_disabled),
            (&mut self.next_page_link, &overrides.next_page_link),
            (&mut self.items, &overrides.items),
            (&mut self.item_link, &overrides.item_link),
            (&mut self.item_title, &overrides.item_title),
            (&mut self.item_variations, &overrides.item_variations),
            (&mut self.product_details, &overrides.product_details),
            (&mut self.swatches, &overrides.swatches),
            (&mut self.swatch_unavailable, &overrides.swatch_unavailable),
            (&mut self.swatch_name, &overrides.swatch_name),
            (&mut self.swatch_link, &overrides.swatch_link),
            (&mut self.variant_select, &overrides.variant_select),
            (&mut self.variant_options, &overrides.variant_options),
            (&mut self.out_of_stock_marker, &overrides.out_of_stock_marker),
            (&mut self.assembly_links, &overrides.assembly_links),
            (&mut self.assembly_unavailable, &overrides.assembly_unavailable),
            (&mut self.product_name, &overrides.product_name),
        ];

        for (field, value) in fields {
            if let Some(value) = value {
                *field = value.clone();
            }
        }

        if let Some(labels) = &overrides.placeholder_labels {
            self.placeholder_labels = labels.clone();
        }

        self
    }

    /// True if `label` is a dropdown prompt rather than a variant
    pub fn is_placeholder(&self, label: &str) -> bool {
        let label = label.trim();
        self.placeholder_labels
            .iter()
            .any(|placeholder| placeholder.trim().eq_ignore_ascii_case(label))
    }
}
