//! Element handles returned by document queries

use std::collections::BTreeMap;
use url::Url;

/// Snapshot of an element taken when it was queried
///
/// Handles are immutable and detached from the live document; re-query the
/// document to observe later changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    outer_html: String,
    base_url: Option<Url>,
}

impl ElementHandle {
    pub fn new(
        tag: impl Into<String>,
        attributes: BTreeMap<String, String>,
        text: impl Into<String>,
        outer_html: impl Into<String>,
        base_url: Option<Url>,
    ) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            text: text.into(),
            outer_html: outer_html.into(),
            base_url,
        }
    }

    /// Builds a handle from a parsed element
    pub(crate) fn from_element(element: scraper::ElementRef<'_>, base_url: Option<&Url>) -> Self {
        let value = element.value();
        let attributes = value
            .attrs()
            .map(|(name, val)| (name.to_string(), val.to_string()))
            .collect();
        let text = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            tag: value.name().to_string(),
            attributes,
            text,
            outer_html: element.html(),
            base_url: base_url.cloned(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whitespace-normalized text content
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn outer_html(&self) -> &str {
        &self.outer_html
    }

    /// URL of the page the element was found on
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// The `href` attribute resolved against the page URL
    pub fn href(&self) -> Option<Url> {
        self.resolve_attr("href")
    }

    /// An attribute value resolved as a URL against the page URL
    pub fn resolve_attr(&self, name: &str) -> Option<Url> {
        let raw = self.attr(name)?;
        match &self.base_url {
            Some(base) => crate::url::resolve_href(raw, base),
            None => Url::parse(raw).ok(),
        }
    }
}
