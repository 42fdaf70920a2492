//! In-memory fetcher serving a fixed table of responses
//!
//! Used to drive the engine without a network: each URL maps to a page, a
//! failure, or nothing (which fetches as `not found`). Every call is counted
//! per URL so callers can check how often the engine fetched something.

use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
enum CannedResponse {
    Page(FetchedPage),
    Failure(u16),
}

/// Fetcher that answers from a table keyed by URL
///
/// # Example
///
/// ```
/// use fanout_crawler::crawler::{start_crawl, CannedFetcher};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = CannedFetcher::new()
///     .with_page("A", "page A", ["B", "C"])
///     .with_page("B", "page B", ["A"])
///     .with_page("C", "page C", ["D"]);
///
/// let pages = start_crawl("A", 2, fetcher).await;
/// let urls: Vec<_> = pages.iter().map(|(url, _)| url.as_str()).collect();
/// assert_eq!(urls, ["A", "B", "C"]);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct CannedFetcher {
    responses: HashMap<String, CannedResponse>,
    calls: Mutex<HashMap<String, usize>>,
    latency: Option<Duration>,
}

impl CannedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `content` and `links` for `url`
    pub fn with_page<I, S>(mut self, url: &str, content: &str, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let page = FetchedPage::new(content, links.into_iter().map(Into::into).collect());
        self.responses
            .insert(url.to_string(), CannedResponse::Page(page));
        self
    }

    /// Fails every fetch of `url` with the given HTTP status
    pub fn with_failure(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), CannedResponse::Failure(status));
        self
    }

    /// Sleeps this long inside every fetch, widening the window for races
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of times `url` has been fetched
    pub fn calls(&self, url: &str) -> usize {
        self.lock_calls().get(url).copied().unwrap_or(0)
    }

    /// Number of fetches across all URLs
    pub fn total_calls(&self) -> usize {
        self.lock_calls().values().sum()
    }

    /// Per-URL fetch counts
    pub fn call_counts(&self) -> HashMap<String, usize> {
        self.lock_calls().clone()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        *self.lock_calls().entry(url.to_string()).or_insert(0) += 1;

        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        match self.responses.get(url) {
            Some(CannedResponse::Page(page)) => Ok(page.clone()),
            Some(CannedResponse::Failure(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_pages() {
        let fetcher = CannedFetcher::new().with_page("A", "hello", ["B"]);
        let page = fetcher.fetch("A").await.unwrap();
        assert_eq!(page.content, "hello");
        assert_eq!(page.links, vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let fetcher = CannedFetcher::new();
        let err = fetcher.fetch("missing").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::NotFound {
                url: "missing".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let fetcher = CannedFetcher::new().with_failure("A", 503);
        let err = fetcher.fetch("A").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_counts_calls() {
        let fetcher = CannedFetcher::new().with_page("A", "a", Vec::<String>::new());
        fetcher.fetch("A").await.unwrap();
        fetcher.fetch("A").await.unwrap();
        let _ = fetcher.fetch("B").await;

        assert_eq!(fetcher.calls("A"), 2);
        assert_eq!(fetcher.calls("B"), 1);
        assert_eq!(fetcher.calls("C"), 0);
        assert_eq!(fetcher.total_calls(), 3);
        assert_eq!(fetcher.call_counts().len(), 2);
    }
}
