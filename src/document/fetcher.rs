//! HTTP page source
//!
//! This module fetches raw pages for the HTML document backend:
//! - building the HTTP client with the configured user agent
//! - GET requests that report the status instead of raising on non-2xx
//! - error classification (timeout vs. transport failure)

use crate::config::BrowserConfig;
use crate::document::{DocumentError, DocumentResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A raw page as returned by a [`PageSource`]
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Page body
    pub body: String,
}

/// Something that can produce the HTML of a URL
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> DocumentResult<FetchedPage>;
}

/// Builds an HTTP client with the configured user agent
///
/// # Arguments
///
/// * `config` - User agent and request timeout settings
///
/// # Returns
///
/// * `Ok(Client)` - Client used for every page fetch of a run
/// * `Err(reqwest::Error)` - The client could not be built
///
/// # Example
///
/// ```no_run
/// use stockwatch::config::BrowserConfig;
/// use stockwatch::document::build_http_client;
///
/// let client = build_http_client(&BrowserConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &BrowserConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page source backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &BrowserConfig) -> DocumentResult<Self> {
        let client = build_http_client(config).map_err(|e| DocumentError::Transport {
            url: String::new(),
            message: e.to_string(),
        })?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &Url, timeout: Duration) -> DocumentResult<FetchedPage> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        Ok(FetchedPage {
            final_url,
            status,
            body,
        })
    }
}

fn classify_error(url: &Url, timeout: Duration, error: reqwest::Error) -> DocumentError {
    if error.is_timeout() {
        DocumentError::Timeout {
            target: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else if error.is_connect() {
        DocumentError::Transport {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        DocumentError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
