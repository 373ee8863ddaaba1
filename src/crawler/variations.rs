//! Variant topology resolution
//!
//! Given a product whose detail page is loaded in the item-detail document,
//! the resolver picks the page's [`VariantTopology`] and reads every
//! variant's availability:
//! - `Simple`: each swatch's unavailable marker, read after a settle delay
//! - `DropdownList`: each option's target page, loaded in the outer document
//! - `SwatchByDropdown`: for each available swatch, its page's options, each
//!   selected in the inner document
//! - `AssemblyOptions`: each link's marker; unavailable links are visited to
//!   recover a readable name, keeping the link text if the visit fails
//!
//! A variant whose data cannot be read is reported and left out of the counts;
//! it never aborts the item.

use crate::catalog::{
    CatalogFamily, ItemContext, Resolution, SelectorSet, SwatchReading, VariantTopology, Variation,
};
use crate::config::ScraperConfig;
use crate::crawler::{NavigationOutcome, RetryPolicy, ScrapeEvent, ScrapeObserver};
use crate::document::{Document, ElementHandle, NavigateOptions, Scope, VariantDocuments};
use crate::state::StockStatus;
use crate::Result;
use std::time::Duration;
use url::Url;

/// Resolves the variants of one product at a time
pub struct VariationResolver<'a> {
    family: CatalogFamily,
    selectors: &'a SelectorSet,
    retry: RetryPolicy,
    navigation_timeout: Duration,
    settle_delay: Duration,
    observer: &'a dyn ScrapeObserver,
}

impl<'a> VariationResolver<'a> {
    pub fn new(
        family: CatalogFamily,
        selectors: &'a SelectorSet,
        config: &ScraperConfig,
        observer: &'a dyn ScrapeObserver,
    ) -> Self {
        Self {
            family,
            selectors,
            retry: RetryPolicy::from_config(config),
            navigation_timeout: config.navigation_timeout(),
            settle_delay: config.settle_delay(),
            observer,
        }
    }

    /// Resolves the product loaded in `docs.detail`
    ///
    /// Fails only when the detail page itself is unusable; per-variant
    /// problems are skipped.
    pub async fn resolve<D: Document>(
        &self,
        docs: VariantDocuments<'_, D>,
        product_id: &str,
        context: &ItemContext,
    ) -> Result<Resolution> {
        docs.detail
            .wait_for_selector(
                Scope::Document,
                &self.selectors.product_details,
                self.navigation_timeout,
            )
            .await?;

        let topology = self
            .family
            .resolve_topology(&*docs.detail, self.selectors)
            .await?;
        let mut resolution = Resolution {
            topology: topology.kind(),
            ..Resolution::none()
        };
        let item = ItemRef {
            product_id,
            context,
        };

        match topology {
            VariantTopology::Simple(swatches) => {
                self.resolve_simple(&*docs.detail, &swatches, &item, &mut resolution)
                    .await;
            }
            VariantTopology::DropdownList(options) => {
                let base = docs.detail.current_url().cloned();
                self.resolve_dropdown(docs.outer, &options, base.as_ref(), &item, &mut resolution)
                    .await;
            }
            VariantTopology::SwatchByDropdown(swatches) => {
                self.resolve_swatch_by_dropdown(docs, &swatches, &item, &mut resolution)
                    .await;
            }
            VariantTopology::AssemblyOptions(links) => {
                self.resolve_assembly(docs.outer, &links, &item, &mut resolution)
                    .await;
            }
            VariantTopology::None => {}
        }

        Ok(resolution)
    }

    async fn resolve_simple<D: Document + ?Sized>(
        &self,
        detail: &D,
        swatches: &[ElementHandle],
        item: &ItemRef<'_>,
        resolution: &mut Resolution,
    ) {
        for swatch in swatches {
            let Some(reading) = self.settled_swatch(detail, swatch, item).await else {
                continue;
            };

            let variant_id = self.variant_id(reading.link.as_ref(), item, &reading.name);
            resolution.record(reading.unavailable);
            resolution.push_variation(item.variation(
                reading.name,
                variant_id,
                reading.unavailable,
            ));
        }
    }

    async fn resolve_dropdown<D: Document + ?Sized>(
        &self,
        outer: &mut D,
        options: &[ElementHandle],
        base: Option<&Url>,
        item: &ItemRef<'_>,
        resolution: &mut Resolution,
    ) {
        for (label, target) in self.option_targets(options, base, item) {
            if !self.load(outer, target.as_str(), item, &label).await {
                continue;
            }

            let is_out_of_stock = match self.out_of_stock(&*outer).await {
                Ok(flag) => flag,
                Err(e) => {
                    item.skipped(self.observer, &label, e.to_string());
                    continue;
                }
            };

            let variant_id = self.variant_id(Some(&target), item, &label);
            resolution.record(is_out_of_stock);
            resolution.push_variation(item.variation(label, variant_id, is_out_of_stock));
        }
    }

    async fn resolve_swatch_by_dropdown<D: Document>(
        &self,
        docs: VariantDocuments<'_, D>,
        swatches: &[ElementHandle],
        item: &ItemRef<'_>,
        resolution: &mut Resolution,
    ) {
        for swatch in swatches {
            let Some(reading) = self.settled_swatch(&*docs.detail, swatch, item).await else {
                continue;
            };

            // An unavailable swatch is one out-of-stock cell
            if reading.unavailable {
                let variant_id = self.variant_id(reading.link.as_ref(), item, &reading.name);
                resolution.record(true);
                resolution.push_variation(item.variation(reading.name, variant_id, true));
                continue;
            }

            let Some(swatch_url) = reading.link.clone() else {
                item.skipped(self.observer, &reading.name, "swatch has no link".to_string());
                continue;
            };

            if !self
                .load(&mut *docs.outer, swatch_url.as_str(), item, &reading.name)
                .await
            {
                continue;
            }

            let options = match docs
                .outer
                .query_selector_all(Scope::Document, &self.selectors.variant_options)
                .await
            {
                Ok(options) => options,
                Err(e) => {
                    item.skipped(self.observer, &reading.name, e.to_string());
                    continue;
                }
            };
            let cells = self.option_values(&options);

            // No nested choices: the swatch page itself is the cell
            if cells.is_empty() {
                match self.out_of_stock(&*docs.outer).await {
                    Ok(is_out_of_stock) => {
                        let variant_id = self.variant_id(Some(&swatch_url), item, &reading.name);
                        resolution.record(is_out_of_stock);
                        resolution.push_variation(item.variation(
                            reading.name.clone(),
                            variant_id,
                            is_out_of_stock,
                        ));
                    }
                    Err(e) => item.skipped(self.observer, &reading.name, e.to_string()),
                }
                continue;
            }

            for (label, value) in cells {
                let name = format!("{} / {}", reading.name, label);

                if !self.load(&mut *docs.inner, swatch_url.as_str(), item, &name).await {
                    continue;
                }

                let selected = docs
                    .inner
                    .select_option(
                        &self.selectors.variant_select,
                        &value,
                        NavigateOptions::new(self.navigation_timeout),
                    )
                    .await;
                match selected {
                    Ok(navigation) if navigation.ok() => {}
                    Ok(navigation) => {
                        item.skipped(
                            self.observer,
                            &name,
                            format!("option page returned HTTP {}", navigation.status),
                        );
                        continue;
                    }
                    Err(e) => {
                        item.skipped(self.observer, &name, e.to_string());
                        continue;
                    }
                }

                let is_out_of_stock = match self.out_of_stock(&*docs.inner).await {
                    Ok(flag) => flag,
                    Err(e) => {
                        item.skipped(self.observer, &name, e.to_string());
                        continue;
                    }
                };

                let variant_url = docs.inner.current_url().cloned();
                let variant_id = self.variant_id(variant_url.as_ref(), item, &name);
                resolution.record(is_out_of_stock);
                resolution.push_variation(item.variation(name, variant_id, is_out_of_stock));
            }
        }
    }

    async fn resolve_assembly<D: Document + ?Sized>(
        &self,
        outer: &mut D,
        links: &[ElementHandle],
        item: &ItemRef<'_>,
        resolution: &mut Resolution,
    ) {
        for link in links {
            let label = link.text().to_string();
            let href = link.href();
            let unavailable = link.has_class(&self.selectors.assembly_unavailable);

            if !unavailable {
                let variant_id = self.variant_id(href.as_ref(), item, &label);
                resolution.record(false);
                resolution.push_variation(item.variation(label, variant_id, false));
                continue;
            }

            // Availability is already known; the page only supplies the name
            let name = match &href {
                Some(target) => self.assembly_name(outer, target, &label).await,
                None => label,
            };

            let variant_id = self.variant_id(href.as_ref(), item, &name);
            resolution.record(true);
            resolution.push_variation(item.variation(name, variant_id, true));
        }
    }

    /// Display name from an assembly option's own page, or `label` if it never loads
    async fn assembly_name<D: Document + ?Sized>(
        &self,
        outer: &mut D,
        target: &Url,
        label: &str,
    ) -> String {
        let options = NavigateOptions::new(self.navigation_timeout);
        let outcome = self
            .retry
            .navigate(outer, target.as_str(), options, self.observer)
            .await;
        if let NavigationOutcome::NotNavigated { .. } = outcome {
            tracing::debug!("Keeping label '{}' for unreachable assembly option", label);
            return label.to_string();
        }

        match outer
            .query_selector(Scope::Document, &self.selectors.product_name)
            .await
        {
            Ok(Some(heading)) if !heading.text().is_empty() => heading.text().to_string(),
            _ => label.to_string(),
        }
    }

    /// Reads a swatch after the settle delay, reporting failures
    async fn settled_swatch<D: Document + ?Sized>(
        &self,
        doc: &D,
        swatch: &ElementHandle,
        item: &ItemRef<'_>,
    ) -> Option<SwatchReading> {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        match self.family.read_swatch(doc, swatch, self.selectors).await {
            Ok(reading) => Some(reading),
            Err(e) => {
                item.skipped(self.observer, swatch.text(), e.to_string());
                None
            }
        }
    }

    /// Navigates with the retry contract; false if the page never loaded
    async fn load<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        url: &str,
        item: &ItemRef<'_>,
        variant: &str,
    ) -> bool {
        let options = NavigateOptions::new(self.navigation_timeout);
        match self.retry.navigate(doc, url, options, self.observer).await {
            NavigationOutcome::Navigated(_) => true,
            NavigationOutcome::NotNavigated { attempts, reason } => {
                item.skipped(
                    self.observer,
                    variant,
                    format!("not navigated after {} attempts: {}", attempts, reason),
                );
                false
            }
        }
    }

    async fn out_of_stock<D: Document + ?Sized>(&self, doc: &D) -> Result<bool> {
        Ok(doc
            .query_selector(Scope::Document, &self.selectors.out_of_stock_marker)
            .await?
            .is_some())
    }

    /// `(label, value)` of every real option; the first placeholder is skipped
    fn option_values(&self, options: &[ElementHandle]) -> Vec<(String, String)> {
        let mut skipped_placeholder = false;
        let mut values = Vec::new();

        for option in options {
            let label = option.text().trim().to_string();
            if !skipped_placeholder && self.selectors.is_placeholder(&label) {
                skipped_placeholder = true;
                continue;
            }

            let value = option.attr("value").unwrap_or_default().trim();
            if value.is_empty() {
                tracing::debug!("Ignoring option '{}' without a value", label);
                continue;
            }
            values.push((label, value.to_string()));
        }

        values
    }

    /// Options resolved to absolute target URLs
    fn option_targets(
        &self,
        options: &[ElementHandle],
        base: Option<&Url>,
        item: &ItemRef<'_>,
    ) -> Vec<(String, Url)> {
        self.option_values(options)
            .into_iter()
            .filter_map(|(label, value)| {
                let target = base.and_then(|base| crate::url::resolve_href(&value, base));
                if target.is_none() {
                    item.skipped(
                        self.observer,
                        &label,
                        format!("option value '{}' is not a URL", value),
                    );
                }
                target.map(|target| (label, target))
            })
            .collect()
    }

    fn variant_id(&self, url: Option<&Url>, item: &ItemRef<'_>, name: &str) -> String {
        url.map(|url| self.family.product_id(url.as_str()))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| fallback_variant_id(item.product_id, name))
    }
}

/// The item a resolution belongs to
struct ItemRef<'a> {
    product_id: &'a str,
    context: &'a ItemContext,
}

impl ItemRef<'_> {
    fn variation(&self, name: String, variant_id: String, is_out_of_stock: bool) -> Variation {
        Variation {
            name,
            variant_id,
            parent_id: self.product_id.to_string(),
            is_out_of_stock,
            stock_status: StockStatus::for_variation(is_out_of_stock, self.context.inherited),
            badge: self.context.badge,
        }
    }

    fn skipped(&self, observer: &dyn ScrapeObserver, variant: &str, reason: String) {
        observer.on_event(&ScrapeEvent::VariantSkipped {
            product_id: self.product_id.to_string(),
            variant: variant.to_string(),
            reason,
        });
    }
}

/// Id for a variant without its own URL: `{productId}-{name-slug}`
fn fallback_variant_id(product_id: &str, name: &str) -> String {
    let slug = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!("{}-{}", product_id, slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TopologyKind;
    use crate::crawler::events::RecordingObserver;
    use crate::document::testing::StaticSite;
    use crate::document::{DocumentPool, HtmlBrowser};
    use crate::state::{aggregate, Badge, StockCounts};

    const PRODUCT: &str = "https://shop.test/easel/p/100";

    fn selectors() -> SelectorSet {
        SelectorSet {
            swatches: "div.product-details ul.swatches > li".to_string(),
            ..SelectorSet::dss()
        }
    }

    fn context() -> ItemContext {
        ItemContext {
            page_number: 1,
            badge: Badge::New,
            inherited: StockStatus::InStock,
        }
    }

    fn page(body: &str) -> String {
        format!(
            r#"<html><head><title>Easel</title></head><body><div class="product-details">
               <h1 class="name">Easel</h1>{}</div></body></html>"#,
            body
        )
    }

    const IN_STOCK: &str = r#"<html><body><div class="product-details"><h1 class="name">Variant</h1></div></body></html>"#;
    const SOLD_OUT: &str = r#"<html><body><div class="product-details"><h1 class="name">Sold Out Variant</h1>
        <span class="stock-status out-of-stock">Out of stock</span></div></body></html>"#;

    async fn resolve(site: StaticSite) -> (Resolution, RecordingObserver) {
        let browser = HtmlBrowser::new(site);
        let mut pool = DocumentPool::acquire(&browser).await.unwrap();
        let observer = RecordingObserver::default();
        let selectors = selectors();

        let mut docs = pool.variant_documents();
        docs.detail
            .navigate(PRODUCT, NavigateOptions::new(Duration::from_secs(1)))
            .await
            .unwrap();

        let resolver = VariationResolver::new(
            CatalogFamily::Dss,
            &selectors,
            &ScraperConfig::without_delays(),
            &observer,
        );
        let resolution = resolver.resolve(docs, "100", &context()).await.unwrap();
        (resolution, observer)
    }

    fn skipped(observer: &RecordingObserver) -> usize {
        observer
            .events()
            .iter()
            .filter(|e| matches!(e, ScrapeEvent::VariantSkipped { .. }))
            .count()
    }

    #[tokio::test]
    async fn test_no_variants() {
        let site = StaticSite::new().page(PRODUCT, &page(""));
        let (resolution, _) = resolve(site).await;
        assert_eq!(resolution, Resolution::none());
    }

    #[tokio::test]
    async fn test_simple_swatches() {
        let site = StaticSite::new().page(
            PRODUCT,
            &page(
                r#"<ul class="swatches">
                   <li><a href="/easel/p/100-red">Red</a></li>
                   <li class="opacity"><a href="/easel/p/100-blue">Blue</a></li>
                   <li><a href="/easel/p/100-green">Green</a></li></ul>"#,
            ),
        );

        let (resolution, _) = resolve(site).await;

        assert_eq!(resolution.topology, TopologyKind::Simple);
        assert_eq!(
            resolution.counts,
            StockCounts {
                total: 3,
                out_of_stock: 1
            }
        );
        let blue = &resolution.variations[1];
        assert_eq!(blue.name, "Blue");
        assert_eq!(blue.variant_id, "100-blue");
        assert_eq!(blue.parent_id, "100");
        assert!(blue.is_out_of_stock);
        assert_eq!(blue.stock_status, StockStatus::OutOfStock);
        assert_eq!(resolution.variations[0].stock_status, StockStatus::InStock);
    }

    #[tokio::test]
    async fn test_dropdown_skips_placeholder_and_counts_remaining() {
        let site = StaticSite::new()
            .page(
                PRODUCT,
                &page(
                    r#"<select class="variant-select">
                       <option value="">Select a Height...</option>
                       <option value="/easel/p/100-s">Short</option>
                       <option value="/easel/p/100-m">Medium</option>
                       <option value="/easel/p/100-t">Tall</option></select>"#,
                ),
            )
            .page("https://shop.test/easel/p/100-s", IN_STOCK)
            .page("https://shop.test/easel/p/100-m", SOLD_OUT)
            .page("https://shop.test/easel/p/100-t", IN_STOCK);

        let (resolution, _) = resolve(site).await;

        assert_eq!(resolution.topology, TopologyKind::DropdownList);
        assert_eq!(
            resolution.counts,
            StockCounts {
                total: 3,
                out_of_stock: 1
            }
        );
        let names: Vec<&str> = resolution.variations.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Short", "Medium", "Tall"]);
        assert!(resolution.variations[1].is_out_of_stock);
    }

    #[tokio::test]
    async fn test_unreachable_option_is_not_counted() {
        let site = StaticSite::new()
            .page(
                PRODUCT,
                &page(
                    r#"<select class="variant-select">
                       <option value="/easel/p/100-s">Short</option>
                       <option value="/easel/p/100-t">Tall</option></select>"#,
                ),
            )
            .page("https://shop.test/easel/p/100-s", SOLD_OUT)
            .unreachable("https://shop.test/easel/p/100-t");

        let (resolution, observer) = resolve(site).await;

        assert_eq!(
            resolution.counts,
            StockCounts {
                total: 1,
                out_of_stock: 1
            }
        );
        assert_eq!(skipped(&observer), 1);
    }

    #[tokio::test]
    async fn test_swatch_by_dropdown_cross_product() {
        let swatch_page = |options: &str| {
            format!(
                r#"<html><body><div class="product-details">
                   <select class="variant-select">{}</select></div></body></html>"#,
                options
            )
        };

        let site = StaticSite::new()
            .page(
                PRODUCT,
                &page(
                    r#"<ul class="swatches">
                       <li><a href="/easel/p/100-red">Red</a></li>
                       <li class="opacity"><a href="/easel/p/100-blue">Blue</a></li>
                       <li><a href="/easel/p/100-green">Green</a></li></ul>
                       <select class="variant-select"><option value="">Select a Style...</option></select>"#,
                ),
            )
            .page(
                "https://shop.test/easel/p/100-red",
                &swatch_page(
                    r#"<option value="">Select a Style...</option>
                       <option value="/easel/p/100-red-s">Small</option>
                       <option value="/easel/p/100-red-l">Large</option>"#,
                ),
            )
            .page("https://shop.test/easel/p/100-red-s", IN_STOCK)
            .page("https://shop.test/easel/p/100-red-l", SOLD_OUT)
            .page(
                "https://shop.test/easel/p/100-green",
                &page(""),
            );

        let (resolution, _) = resolve(site).await;

        assert_eq!(resolution.topology, TopologyKind::SwatchByDropdown);
        // red/small, red/large, blue (unavailable swatch), green (no options)
        assert_eq!(
            resolution.counts,
            StockCounts {
                total: 4,
                out_of_stock: 2
            }
        );
        let ids: Vec<&str> = resolution
            .variations
            .iter()
            .map(|v| v.variant_id.as_str())
            .collect();
        assert_eq!(ids, vec!["100-red-s", "100-red-l", "100-blue", "100-green"]);
        assert_eq!(resolution.variations[1].name, "Red / Large");
    }

    #[tokio::test]
    async fn test_assembly_options() {
        let site = StaticSite::new()
            .page(
                PRODUCT,
                &page(
                    r#"<div class="assembly-options">
                       <a class="assembly-option" href="/easel/p/100-kit">Kit</a>
                       <a class="assembly-option unavailable" href="/easel/p/100-built">Built</a></div>"#,
                ),
            )
            .page("https://shop.test/easel/p/100-built", SOLD_OUT);

        let (resolution, _) = resolve(site).await;

        assert_eq!(resolution.topology, TopologyKind::AssemblyOptions);
        assert_eq!(
            resolution.counts,
            StockCounts {
                total: 2,
                out_of_stock: 1
            }
        );
        assert_eq!(resolution.variations[1].name, "Sold Out Variant");
        assert_eq!(resolution.variations[0].name, "Kit");
    }

    #[tokio::test]
    async fn test_unreachable_assembly_option_still_counts() {
        let site = StaticSite::new()
            .page(
                PRODUCT,
                &page(
                    r#"<div class="assembly-options">
                       <a class="assembly-option" href="/easel/p/100-kit">Kit</a>
                       <a class="assembly-option unavailable" href="/easel/p/100-built">Built</a></div>"#,
                ),
            )
            .unreachable("https://shop.test/easel/p/100-built");

        let (resolution, observer) = resolve(site).await;

        assert_eq!(
            resolution.counts,
            StockCounts {
                total: 2,
                out_of_stock: 1
            }
        );
        let built = &resolution.variations[1];
        assert_eq!(built.name, "Built");
        assert_eq!(built.variant_id, "100-built");
        assert!(built.is_out_of_stock);
        assert_eq!(skipped(&observer), 0);
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, ScrapeEvent::NavigationFailed { .. })));
        assert_eq!(
            aggregate(resolution.counts, StockStatus::InStock),
            StockStatus::PartiallyOutOfStock
        );
    }

    #[test]
    fn test_fallback_variant_id() {
        assert_eq!(fallback_variant_id("100", "Red / Large"), "100-red-large");
    }
}
