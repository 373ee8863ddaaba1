//! Static HTML document backend
//!
//! Pages are fetched through a [`PageSource`] and queried with CSS selectors.
//! Parsed trees are never held across an await point; every query re-parses
//! the stored body so documents stay `Send`.

use crate::document::{
    Browser, Document, DocumentError, DocumentResult, ElementHandle, Navigation, NavigateOptions,
    PageSource, Scope,
};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

/// A page currently loaded in a document
#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    status: u16,
    body: String,
}

/// A document over fetched HTML
#[derive(Debug)]
pub struct HtmlDocument<S> {
    source: S,
    current: Option<LoadedPage>,
}

impl<S: PageSource> HtmlDocument<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: None,
        }
    }

    /// Status of the last navigation, if any
    pub fn status(&self) -> Option<u16> {
        self.current.as_ref().map(|page| page.status)
    }

    fn page(&self) -> DocumentResult<&LoadedPage> {
        self.current.as_ref().ok_or(DocumentError::NoPage)
    }

    fn select_all(&self, scope: Scope<'_>, selector: &str) -> DocumentResult<Vec<ElementHandle>> {
        let parsed = parse_selector(selector)?;

        match scope {
            Scope::Document => {
                let page = self.page()?;
                let html = Html::parse_document(&page.body);
                Ok(html
                    .select(&parsed)
                    .map(|element| ElementHandle::from_element(element, Some(&page.url)))
                    .collect())
            }
            Scope::Element(handle) => {
                let fragment = Html::parse_fragment(handle.outer_html());
                let Some(top) = fragment
                    .root_element()
                    .children()
                    .find_map(ElementRef::wrap)
                else {
                    return Ok(Vec::new());
                };

                Ok(top
                    .select(&parsed)
                    .filter(|element| *element != top)
                    .map(|element| ElementHandle::from_element(element, handle.base_url()))
                    .collect())
            }
        }
    }

    fn page_title(&self) -> DocumentResult<String> {
        let page = self.page()?;
        let html = Html::parse_document(&page.body);
        let selector = parse_selector("title")?;
        Ok(html
            .select(&selector)
            .next()
            .map(|title| title.text().collect::<String>().trim().to_string())
            .unwrap_or_default())
    }
}

fn parse_selector(selector: &str) -> DocumentResult<Selector> {
    Selector::parse(selector).map_err(|_| DocumentError::InvalidSelector(selector.to_string()))
}

#[async_trait]
impl<S: PageSource> Document for HtmlDocument<S> {
    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> DocumentResult<Navigation> {
        let target = Url::parse(url).map_err(|source| DocumentError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let fetched = tokio::time::timeout(options.timeout, self.source.fetch(&target, options.timeout))
            .await
            .map_err(|_| DocumentError::Timeout {
                target: url.to_string(),
                timeout_ms: options.timeout.as_millis() as u64,
            })??;

        let navigation = Navigation {
            url: fetched.final_url.clone(),
            status: fetched.status,
        };

        self.current = Some(LoadedPage {
            url: fetched.final_url,
            status: fetched.status,
            body: fetched.body,
        });

        Ok(navigation)
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|page| &page.url)
    }

    async fn query_selector(
        &self,
        scope: Scope<'_>,
        selector: &str,
    ) -> DocumentResult<Option<ElementHandle>> {
        Ok(self.select_all(scope, selector)?.into_iter().next())
    }

    async fn query_selector_all(
        &self,
        scope: Scope<'_>,
        selector: &str,
    ) -> DocumentResult<Vec<ElementHandle>> {
        self.select_all(scope, selector)
    }

    async fn evaluate(&self, scope: Scope<'_>, script: &str) -> DocumentResult<serde_json::Value> {
        let value = match (scope, script.trim()) {
            (Scope::Document, "document.title") => self.page_title()?,
            (Scope::Document, "location.href" | "window.location.href") => {
                self.page()?.url.to_string()
            }
            (Scope::Element(handle), "el => el.innerText") => handle.text().to_string(),
            (Scope::Element(handle), "el => el.href") => {
                handle.href().map(String::from).unwrap_or_default()
            }
            (_, other) => return Err(DocumentError::Unsupported(other.to_string())),
        };

        Ok(serde_json::Value::String(value))
    }

    async fn wait_for_selector(
        &self,
        scope: Scope<'_>,
        selector: &str,
        timeout: Duration,
    ) -> DocumentResult<ElementHandle> {
        // A fetched document never changes, so the first look is final
        self.select_all(scope, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| DocumentError::Timeout {
                target: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn select_option(
        &mut self,
        select_selector: &str,
        value: &str,
        options: NavigateOptions,
    ) -> DocumentResult<Navigation> {
        let select = self
            .select_all(Scope::Document, select_selector)?
            .into_iter()
            .next()
            .ok_or_else(|| DocumentError::ElementNotFound(select_selector.to_string()))?;

        let has_option = self
            .select_all(Scope::Element(&select), "option")?
            .iter()
            .any(|option| option.attr("value") == Some(value));
        if !has_option {
            return Err(DocumentError::ElementNotFound(format!(
                "{} option[value=\"{}\"]",
                select_selector, value
            )));
        }

        // Selecting an option loads the variant page the option points to
        let base = self.page()?.url.clone();
        let target = crate::url::resolve_href(value, &base)
            .ok_or_else(|| DocumentError::ElementNotFound(format!("URL for option {}", value)))?;

        self.navigate(target.as_str(), options).await
    }

    async fn close(&mut self) -> DocumentResult<()> {
        self.current = None;
        Ok(())
    }
}

/// Browser handing out [`HtmlDocument`]s that share one page source
#[derive(Debug, Clone)]
pub struct HtmlBrowser<S> {
    source: S,
}

impl<S: PageSource + Clone> HtmlBrowser<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: PageSource + Clone> Browser for HtmlBrowser<S> {
    type Document = HtmlDocument<S>;

    async fn new_document(&self) -> DocumentResult<Self::Document> {
        Ok(HtmlDocument::new(self.source.clone()))
    }

    async fn close(&self) -> DocumentResult<()> {
        tracing::debug!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::testing::StaticSite;

    const PRODUCT: &str = r#"<html><head><title>Easel</title></head><body>
        <div class="product-details">
          <ul class="swatches">
            <li class="swatch"><a href="/easel/p/1-red">Red</a></li>
            <li class="swatch opacity"><a href="/easel/p/1-blue">Blue</a></li>
          </ul>
          <select class="variant-select">
            <option value="">Select a Height...</option>
            <option value="/easel/p/1-tall">Tall</option>
          </select>
        </div>
    </body></html>"#;

    fn site() -> StaticSite {
        StaticSite::new()
            .page("https://shop.test/easel/p/1", PRODUCT)
            .page("https://shop.test/easel/p/1-tall", "<html><body>Tall</body></html>")
            .status("https://shop.test/gone", 404, "<html><body>Gone</body></html>")
    }

    async fn loaded() -> HtmlDocument<StaticSite> {
        let mut doc = HtmlDocument::new(site());
        doc.navigate(
            "https://shop.test/easel/p/1",
            NavigateOptions::new(Duration::from_secs(5)),
        )
        .await
        .unwrap();
        doc
    }

    #[tokio::test]
    async fn test_query_before_navigation_fails() {
        let doc = HtmlDocument::new(site());
        let err = doc
            .query_selector(Scope::Document, "li")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::NoPage));
    }

    #[tokio::test]
    async fn test_navigate_reports_status() {
        let mut doc = HtmlDocument::new(site());
        let nav = doc
            .navigate(
                "https://shop.test/gone",
                NavigateOptions::new(Duration::from_secs(5)),
            )
            .await
            .unwrap();
        assert_eq!(nav.status, 404);
        assert!(!nav.ok());
        assert_eq!(doc.status(), Some(404));
    }

    #[tokio::test]
    async fn test_query_all_and_scoped_query() {
        let doc = loaded().await;
        let swatches = doc
            .query_selector_all(Scope::Document, "li.swatch")
            .await
            .unwrap();
        assert_eq!(swatches.len(), 2);
        assert!(swatches[1].has_class("opacity"));

        let link = doc
            .query_selector(Scope::Element(&swatches[0]), "a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(link.href().unwrap().as_str(), "https://shop.test/easel/p/1-red");
    }

    #[tokio::test]
    async fn test_scoped_query_excludes_scope_element() {
        let doc = loaded().await;
        let swatch = doc
            .query_selector(Scope::Document, "li.swatch")
            .await
            .unwrap()
            .unwrap();
        let nested = doc
            .query_selector_all(Scope::Element(&swatch), "li")
            .await
            .unwrap();
        assert!(nested.is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_missing_selector_times_out() {
        let doc = loaded().await;
        let err = doc
            .wait_for_selector(Scope::Document, "div.product-grid", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_invalid_selector() {
        let doc = loaded().await;
        let err = doc
            .query_selector(Scope::Document, "li[[")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidSelector(_)));
    }

    #[tokio::test]
    async fn test_evaluate() {
        let doc = loaded().await;
        let title = doc.evaluate(Scope::Document, "document.title").await.unwrap();
        assert_eq!(title, serde_json::json!("Easel"));

        let href = doc.evaluate(Scope::Document, "location.href").await.unwrap();
        assert_eq!(href, serde_json::json!("https://shop.test/easel/p/1"));

        let err = doc
            .evaluate(Scope::Document, "document.cookie")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_select_option_loads_variant_page() {
        let mut doc = loaded().await;
        let nav = doc
            .select_option(
                "select.variant-select",
                "/easel/p/1-tall",
                NavigateOptions::new(Duration::from_secs(5)),
            )
            .await
            .unwrap();
        assert!(nav.ok());
        assert_eq!(
            doc.current_url().unwrap().as_str(),
            "https://shop.test/easel/p/1-tall"
        );
    }

    #[tokio::test]
    async fn test_select_unknown_option() {
        let mut doc = loaded().await;
        let err = doc
            .select_option(
                "select.variant-select",
                "/easel/p/1-short",
                NavigateOptions::new(Duration::from_secs(5)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::ElementNotFound(_)));
    }

    #[tokio::test]
    async fn test_browser_documents_are_independent() {
        let browser = HtmlBrowser::new(site());
        let mut first = browser.new_document().await.unwrap();
        let second = browser.new_document().await.unwrap();

        first
            .navigate(
                "https://shop.test/easel/p/1",
                NavigateOptions::new(Duration::from_secs(5)),
            )
            .await
            .unwrap();
        assert!(first.current_url().is_some());
        assert!(second.current_url().is_none());

        first.close().await.unwrap();
        assert!(first.current_url().is_none());
    }
}
