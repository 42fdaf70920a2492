//! Crawl engine - depth-bounded concurrent fan-out
//!
//! Every URL the crawl touches becomes its own tokio task carrying
//! `(url, remaining depth)`. A task moves through
//! `Pending -> Claimed -> Fetching -> Expanding -> Done`, or straight from
//! `Pending` to `Rejected` when its depth budget is spent or its URL is
//! already claimed. Children are spawned and not awaited; the run is over
//! when the completion barrier, which counts every task transitively, drains.

use crate::config::CrawlerConfig;
use crate::crawler::barrier::CompletionBarrier;
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::visited::{VisitRecord, VisitedSet};
use crate::output::stats::{CrawlStatistics, CrawlStats};
use crate::state::{RejectReason, TaskLifecycle, TaskState};
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Everything known about a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub seed: String,
    pub max_depth: u32,

    /// `(url, content)` of every page fetched, sorted by URL
    pub pages: Vec<(String, String)>,

    /// `(url, error)` of every fetch that failed, sorted by URL
    pub failures: Vec<(String, String)>,

    /// Every claimed URL with its outcome
    pub records: Vec<VisitRecord>,

    pub stats: CrawlStatistics,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl CrawlReport {
    /// URLs of the fetched pages, in report order
    pub fn urls(&self) -> Vec<&str> {
        self.pages.iter().map(|(url, _)| url.as_str()).collect()
    }
}

/// Drives crawls over a [`Fetcher`]
///
/// An engine can run any number of crawls; each run gets a fresh visited set,
/// barrier and statistics.
pub struct CrawlEngine {
    fetcher: Arc<dyn Fetcher>,
    max_concurrent_fetches: usize,
}

impl CrawlEngine {
    /// Creates an engine with unbounded fetch concurrency
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            max_concurrent_fetches: 0,
        }
    }

    /// Creates an engine using the `[crawler]` section's concurrency bound
    pub fn from_config(config: &CrawlerConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(fetcher).with_max_concurrent_fetches(config.max_concurrent_fetches as usize)
    }

    /// Caps the number of fetches in flight at once; 0 means unbounded
    ///
    /// Only the fetch itself holds a slot. Tasks waiting for a slot have
    /// already claimed their URL.
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit;
        self
    }

    /// Crawls from `seed`, following links up to `max_depth` hops
    ///
    /// `max_depth` counts the seed itself: 0 fetches nothing, 1 fetches only
    /// the seed, 2 the seed and the pages it links to, and so on. Resolves
    /// once every task of the run has finished. Fetch failures are recorded in
    /// the report rather than returned.
    pub async fn run(&self, seed: &str, max_depth: u32) -> CrawlReport {
        let started_at = Utc::now();
        let clock = Instant::now();

        let run = Arc::new(CrawlRun {
            fetcher: Arc::clone(&self.fetcher),
            visited: VisitedSet::new(),
            barrier: Arc::new(CompletionBarrier::new()),
            stats: CrawlStats::new(),
            fetch_slots: (self.max_concurrent_fetches > 0)
                .then(|| Semaphore::new(self.max_concurrent_fetches)),
        });

        tracing::info!("Starting crawl of {} with max depth {}", seed, max_depth);

        dispatch(&run, seed.to_string(), max_depth);
        run.barrier.wait().await;

        let stats = run.stats.snapshot();
        let elapsed = clock.elapsed();
        tracing::info!(
            "Crawl completed: {} pages fetched, {} failed, in {:?}",
            stats.pages_fetched,
            stats.fetch_failures,
            elapsed
        );

        CrawlReport {
            seed: seed.to_string(),
            max_depth,
            pages: run.visited.snapshot(),
            failures: run.visited.failures(),
            records: run.visited.records(),
            stats,
            started_at,
            finished_at: Utc::now(),
            elapsed,
        }
    }
}

/// Crawls from `seed` to `max_depth` with `fetcher` and returns the fetched pages
///
/// Shorthand for [`CrawlEngine::run`] with unbounded concurrency, keeping
/// only `(url, content)` pairs.
pub async fn start_crawl<F>(seed: &str, max_depth: u32, fetcher: F) -> Vec<(String, String)>
where
    F: Fetcher + 'static,
{
    CrawlEngine::new(Arc::new(fetcher))
        .run(seed, max_depth)
        .await
        .pages
}

/// State shared by every task of one run
struct CrawlRun {
    fetcher: Arc<dyn Fetcher>,
    visited: VisitedSet,
    barrier: Arc<CompletionBarrier>,
    stats: CrawlStats,
    fetch_slots: Option<Semaphore>,
}

/// Registers a task with the barrier, then spawns it
fn dispatch(run: &Arc<CrawlRun>, url: String, depth: u32) {
    let pending = run.barrier.register();
    run.stats.record_task_spawned();

    let run = Arc::clone(run);
    tokio::spawn(async move {
        let _pending = pending;
        if let Err(e) = visit(&run, &url, depth).await {
            tracing::error!("Crawl task for {} aborted: {}", url, e);
        }
    });
}

async fn visit(run: &Arc<CrawlRun>, url: &str, depth: u32) -> Result<(), CrawlError> {
    let mut task = TaskLifecycle::new();

    if depth == 0 {
        return reject(run, &mut task, url, RejectReason::DepthExhausted);
    }

    if !run.visited.claim_if_unvisited(url) {
        return reject(run, &mut task, url, RejectReason::AlreadyClaimed);
    }
    task.advance(TaskState::Claimed)?;

    task.advance(TaskState::Fetching)?;
    let fetched = {
        // The semaphore is never closed, so acquire only fails if that changes.
        let _slot = match &run.fetch_slots {
            Some(slots) => slots.acquire().await.ok(),
            None => None,
        };
        run.fetcher.fetch(url).await
    };

    let FetchedPage { content, links } = match fetched {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("{}", e);
            run.stats.record_fetch_failure();
            run.visited.record_failure(url, e.to_string());
            return task.advance(TaskState::Done);
        }
    };

    tracing::info!("found: {}", url);
    run.stats.record_page_fetched(links.len());

    task.advance(TaskState::Expanding)?;
    for link in &links {
        dispatch(run, link.clone(), depth - 1);
    }
    run.visited.record(url, content, links);

    task.advance(TaskState::Done)
}

fn reject(
    run: &CrawlRun,
    task: &mut TaskLifecycle,
    url: &str,
    reason: RejectReason,
) -> Result<(), CrawlError> {
    match reason {
        RejectReason::DepthExhausted => run.stats.record_rejected_depth(),
        RejectReason::AlreadyClaimed => run.stats.record_rejected_duplicate(),
    }
    tracing::trace!("Skipping {}: {}", url, reason);
    task.advance(TaskState::Rejected)
}
