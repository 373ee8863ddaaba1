//! Document automation layer
//!
//! This module defines the capability set the crawler consumes from a
//! browser-like backend:
//! - navigating a document and reporting the response status
//! - querying elements (document- or element-scoped)
//! - evaluating read-only expressions in the page
//! - waiting for a selector with a bounded timeout
//! - selecting a dropdown option
//!
//! `HtmlBrowser` implements it over fetched HTML. The crawler only depends on
//! the [`Browser`] and [`Document`] traits.

mod element;
mod fetcher;
mod html;
mod pool;

#[cfg(test)]
pub(crate) mod testing;

pub use element::ElementHandle;
pub use fetcher::{build_http_client, FetchedPage, HttpSource, PageSource};
pub use html::{HtmlBrowser, HtmlDocument};
pub use pool::{DocumentPool, DocumentRole, VariantDocuments};

use crate::ErrorClass;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by document operations
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Timed out after {timeout_ms}ms waiting for {target}")]
    Timeout { target: String, timeout_ms: u64 },

    #[error("HTTP error for {url}: status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("No page is loaded in this document")]
    NoPage,

    #[error("Document for role {0} is not available")]
    MissingHandle(&'static str),

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No element matches {0}")]
    ElementNotFound(String),

    #[error("Unsupported expression: {0}")]
    Unsupported(String),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl DocumentError {
    /// Timeouts, non-2xx statuses and document-context anomalies are retryable;
    /// selector and extraction problems are skippable.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::NoPage
            | Self::MissingHandle(_)
            | Self::Transport { .. } => ErrorClass::Retryable,
            Self::InvalidSelector(_)
            | Self::ElementNotFound(_)
            | Self::Unsupported(_)
            | Self::InvalidUrl { .. } => ErrorClass::Skippable,
        }
    }
}

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// What a navigation waits for before it is considered complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitCondition {
    /// Full load of the response
    #[default]
    Load,

    /// DOM content available; subresources may still be loading
    DomContentLoaded,
}

/// Options for a single navigation
#[derive(Debug, Clone, Copy)]
pub struct NavigateOptions {
    pub timeout: Duration,
    pub wait_until: WaitCondition,
}

impl NavigateOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            wait_until: WaitCondition::Load,
        }
    }

    pub fn dom_content_loaded(timeout: Duration) -> Self {
        Self {
            timeout,
            wait_until: WaitCondition::DomContentLoaded,
        }
    }
}

/// Result of a navigation that produced a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Final URL of the loaded document
    pub url: Url,

    /// HTTP status of the main response
    pub status: u16,
}

impl Navigation {
    /// True for 2xx responses
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where a query is evaluated
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// The whole loaded document
    Document,

    /// Descendants of a previously returned element
    Element(&'a ElementHandle),
}

/// One automated document (a browser tab)
///
/// Implementations never return partial results silently: every operation
/// either succeeds or raises a [`DocumentError`].
#[async_trait]
pub trait Document: Send + Sync {
    /// Loads `url`; non-2xx responses are reported in the returned status
    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> DocumentResult<Navigation>;

    /// URL of the currently loaded page, if any
    fn current_url(&self) -> Option<&Url>;

    /// First element matching `selector` in `scope`
    async fn query_selector(
        &self,
        scope: Scope<'_>,
        selector: &str,
    ) -> DocumentResult<Option<ElementHandle>>;

    /// All elements matching `selector` in `scope`, in document order
    async fn query_selector_all(
        &self,
        scope: Scope<'_>,
        selector: &str,
    ) -> DocumentResult<Vec<ElementHandle>>;

    /// Evaluates a read-only expression against the page or an element
    async fn evaluate(&self, scope: Scope<'_>, script: &str) -> DocumentResult<serde_json::Value>;

    /// Waits up to `timeout` for `selector` to match in `scope`
    async fn wait_for_selector(
        &self,
        scope: Scope<'_>,
        selector: &str,
        timeout: Duration,
    ) -> DocumentResult<ElementHandle>;

    /// Chooses the option with `value` in the select matched by `select_selector`
    async fn select_option(
        &mut self,
        select_selector: &str,
        value: &str,
        options: NavigateOptions,
    ) -> DocumentResult<Navigation>;

    /// Releases the document
    async fn close(&mut self) -> DocumentResult<()>;
}

/// A browser that hands out independent documents
#[async_trait]
pub trait Browser: Send + Sync {
    type Document: Document;

    /// Opens a new, empty document
    async fn new_document(&self) -> DocumentResult<Self::Document>;

    /// Shuts the browser down
    async fn close(&self) -> DocumentResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_ok() {
        let url = Url::parse("https://shop.test/").unwrap();
        assert!(Navigation {
            url: url.clone(),
            status: 200
        }
        .ok());
        assert!(Navigation {
            url: url.clone(),
            status: 204
        }
        .ok());
        assert!(!Navigation { url, status: 503 }.ok());
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(DocumentError::NoPage.class(), ErrorClass::Retryable);
        assert_eq!(
            DocumentError::HttpStatus {
                url: "https://shop.test/".to_string(),
                status: 500
            }
            .class(),
            ErrorClass::Retryable
        );
        assert_eq!(
            DocumentError::ElementNotFound("a".to_string()).class(),
            ErrorClass::Skippable
        );
    }
}
