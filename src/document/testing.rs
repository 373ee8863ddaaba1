//! In-memory page source for unit tests

use crate::document::{DocumentError, DocumentResult, FetchedPage, PageSource};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Serves fixed pages keyed by absolute URL; unknown URLs return 404
#[derive(Debug, Clone, Default)]
pub(crate) struct StaticSite {
    pages: Arc<HashMap<String, (u16, String)>>,
    unreachable: Arc<HashSet<String>>,
    hits: Arc<Mutex<Vec<String>>>,
}

impl StaticSite {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(self, url: &str, body: &str) -> Self {
        self.status(url, 200, body)
    }

    pub(crate) fn status(mut self, url: &str, status: u16, body: &str) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), (status, body.to_string()));
        self
    }

    /// Requests for `url` fail with a transport error
    pub(crate) fn unreachable(mut self, url: &str) -> Self {
        Arc::make_mut(&mut self.unreachable).insert(url.to_string());
        self
    }

    /// Every URL requested so far, in order
    pub(crate) fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub(crate) fn hit_count(&self, url: &str) -> usize {
        self.hits().iter().filter(|hit| hit.as_str() == url).count()
    }
}

#[async_trait]
impl PageSource for StaticSite {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> DocumentResult<FetchedPage> {
        self.hits.lock().unwrap().push(url.to_string());

        if self.unreachable.contains(url.as_str()) {
            return Err(DocumentError::Transport {
                url: url.to_string(),
                message: "Connection refused".to_string(),
            });
        }

        let (status, body) = self
            .pages
            .get(url.as_str())
            .cloned()
            .unwrap_or((404, "<html><body>Not Found</body></html>".to_string()));

        Ok(FetchedPage {
            final_url: url.clone(),
            status,
            body,
        })
    }
}
