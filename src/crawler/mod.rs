//! Crawler module for concurrent page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - The crawl engine and its per-task state machine
//! - The visited set that deduplicates URLs across tasks
//! - The completion barrier that tells the caller when every task is done
//! - The fetch capability, with HTTP and in-memory implementations
//! - HTML link extraction

mod barrier;
mod canned;
mod engine;
mod fetcher;
mod parser;
mod visited;

pub use barrier::{CompletionBarrier, PendingTask};
pub use canned::CannedFetcher;
pub use engine::{start_crawl, CrawlEngine, CrawlReport};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use parser::{parse_html, ParsedPage};
pub use visited::{VisitOutcome, VisitRecord, VisitedSet};

use crate::config::Config;
use crate::CrawlError;
use std::sync::Arc;

/// Runs a complete HTTP crawl described by `config`
///
/// This is the main entry point for the binary. It will:
/// 1. Build the HTTP fetcher from the `[user-agent]` and `[http]` sections
/// 2. Crawl from `seed` to `config.crawler.max_depth`
/// 3. Return the report once every task has finished
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed` - Absolute http(s) URL to start from
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran to completion (individual fetches may have failed)
/// * `Err(CrawlError)` - The seed was invalid or the HTTP client could not be built
pub async fn crawl(config: &Config, seed: &str) -> Result<CrawlReport, CrawlError> {
    let seed = crate::url::normalize_link(seed, config.crawler.link_mode).map_err(|source| {
        CrawlError::InvalidSeed {
            url: seed.to_string(),
            source,
        }
    })?;

    let fetcher = HttpFetcher::new(config)?;
    let engine = CrawlEngine::from_config(&config.crawler, Arc::new(fetcher));

    Ok(engine.run(&seed, config.crawler.max_depth).await)
}
