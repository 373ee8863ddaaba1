//! Catalog families and scraped records
//!
//! Each supported storefront is a [`CatalogFamily`]. The family decides how a
//! listing stub's title and variation flag are read and how a swatch is
//! interpreted; everything else is driven by the family's [`SelectorSet`].

mod item;
mod selectors;
mod topology;

pub use item::{CatalogItem, ItemContext, ListingStub, Variation};
pub use selectors::SelectorSet;
pub use topology::{Resolution, TopologyKind, VariantTopology};

use crate::document::{Document, ElementHandle, Scope};
use crate::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Supported catalog storefronts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFamily {
    /// Discount School Supply
    Dss,

    /// Really Good Stuff
    Rgs,
}

/// What a swatch element says about its variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwatchReading {
    pub name: String,

    /// Variant page, when the swatch links to one
    pub link: Option<Url>,

    pub unavailable: bool,
}

impl CatalogFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dss => "dss",
            Self::Rgs => "rgs",
        }
    }

    /// Built-in selectors for this family
    pub fn default_selectors(&self) -> SelectorSet {
        match self {
            Self::Dss => SelectorSet::dss(),
            Self::Rgs => SelectorSet::rgs(),
        }
    }

    /// Product identifier derived from a product URL
    pub fn product_id(&self, url: &str) -> String {
        crate::url::product_id(url, matches!(self, Self::Rgs))
    }

    /// Reads the product title of a listing stub
    ///
    /// A stub without a readable title yields an empty string so the item is
    /// still scraped, untitled.
    pub async fn parse_title<D: Document + ?Sized>(
        &self,
        doc: &D,
        stub: &ElementHandle,
        selectors: &SelectorSet,
    ) -> Result<String> {
        let Some(title_el) = doc
            .query_selector(Scope::Element(stub), &selectors.item_title)
            .await?
        else {
            tracing::debug!("No title matched {}; keeping stub untitled", selectors.item_title);
            return Ok(String::new());
        };

        let title = match self {
            Self::Dss => doc
                .evaluate(Scope::Element(&title_el), "el => el.innerText")
                .await?
                .as_str()
                .unwrap_or_default()
                .trim()
                .to_string(),
            Self::Rgs => title_el.attr("title").unwrap_or_default().trim().to_string(),
        };

        Ok(title)
    }

    /// Whether a listing stub advertises variants
    pub async fn detect_variations<D: Document + ?Sized>(
        &self,
        doc: &D,
        stub: &ElementHandle,
        selectors: &SelectorSet,
    ) -> Result<bool> {
        match self {
            Self::Dss => {
                let Some(container) = doc
                    .query_selector(Scope::Element(stub), &selectors.item_variations)
                    .await?
                else {
                    return Ok(false);
                };
                let spans = doc
                    .query_selector_all(Scope::Element(&container), "span")
                    .await?;
                Ok(!spans.is_empty())
            }
            Self::Rgs => {
                let link = format!("{} span label a", selectors.item_variations);
                Ok(doc
                    .query_selector(Scope::Element(stub), &link)
                    .await?
                    .is_some())
            }
        }
    }

    /// Reads the name, link and availability of one swatch
    pub async fn read_swatch<D: Document + ?Sized>(
        &self,
        doc: &D,
        swatch: &ElementHandle,
        selectors: &SelectorSet,
    ) -> Result<SwatchReading> {
        let reading = match self {
            Self::Dss => {
                let name = doc
                    .evaluate(Scope::Element(swatch), "el => el.innerText")
                    .await?
                    .as_str()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                let link = doc
                    .query_selector(Scope::Element(swatch), &selectors.swatch_link)
                    .await?
                    .and_then(|a| a.href());

                SwatchReading {
                    name,
                    link,
                    unavailable: swatch.has_class(&selectors.swatch_unavailable),
                }
            }
            Self::Rgs => {
                let name = doc
                    .query_selector(Scope::Element(swatch), &selectors.swatch_name)
                    .await?
                    .map(|span| span.text().trim().to_string())
                    .unwrap_or_default();
                let link = doc
                    .query_selector(Scope::Element(swatch), &selectors.swatch_link)
                    .await?
                    .and_then(|span| {
                        let base = swatch.base_url()?;
                        crate::url::resolve_href(span.text(), base)
                    });
                let unavailable = doc
                    .query_selector(Scope::Element(swatch), &selectors.swatch_unavailable)
                    .await?
                    .is_some();

                SwatchReading {
                    name,
                    link,
                    unavailable,
                }
            }
        };

        if reading.name.is_empty() {
            return Err(ScrapeError::Extraction {
                what: "swatch name".to_string(),
                reason: format!("empty name in {}", swatch.outer_html()),
            });
        }

        Ok(reading)
    }

    /// Determines which variant topology a loaded detail page uses
    ///
    /// Detection order: assembly links, swatches with a dropdown, swatches,
    /// dropdown options, nothing.
    pub async fn resolve_topology<D: Document + ?Sized>(
        &self,
        doc: &D,
        selectors: &SelectorSet,
    ) -> Result<VariantTopology> {
        let assembly = doc
            .query_selector_all(Scope::Document, &selectors.assembly_links)
            .await?;
        if !assembly.is_empty() {
            return Ok(VariantTopology::AssemblyOptions(assembly));
        }

        let swatches = doc
            .query_selector_all(Scope::Document, &selectors.swatches)
            .await?;
        let has_dropdown = doc
            .query_selector(Scope::Document, &selectors.variant_select)
            .await?
            .is_some();

        if !swatches.is_empty() {
            return Ok(if has_dropdown {
                VariantTopology::SwatchByDropdown(swatches)
            } else {
                VariantTopology::Simple(swatches)
            });
        }

        let options = doc
            .query_selector_all(Scope::Document, &selectors.variant_options)
            .await?;
        if !options.is_empty() {
            return Ok(VariantTopology::DropdownList(options));
        }

        Ok(VariantTopology::None)
    }
}

impl fmt::Display for CatalogFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
