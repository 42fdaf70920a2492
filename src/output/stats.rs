//! Crawl statistics
//!
//! [`CrawlStats`] is a set of lock-free counters bumped by crawl tasks while
//! they run. [`CrawlStatistics`] is the plain-value snapshot taken once the
//! crawl has finished, and is what gets printed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters shared by all tasks of a crawl
#[derive(Debug, Default)]
pub struct CrawlStats {
    tasks_spawned: AtomicU64,
    pages_fetched: AtomicU64,
    fetch_failures: AtomicU64,
    rejected_duplicate: AtomicU64,
    rejected_depth: AtomicU64,
    links_discovered: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_task_spawned(&self) {
        self.tasks_spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful fetch that yielded `links` outbound links
    pub fn record_page_fetched(&self, links: usize) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.links_discovered
            .fetch_add(links as u64, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_duplicate(&self) {
        self.rejected_duplicate.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_depth(&self) {
        self.rejected_depth.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CrawlStatistics {
        CrawlStatistics {
            tasks_spawned: self.tasks_spawned.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            rejected_duplicate: self.rejected_duplicate.load(Ordering::Relaxed),
            rejected_depth: self.rejected_depth.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Tasks dispatched, including the seed task
    pub tasks_spawned: u64,

    /// URLs fetched successfully
    pub pages_fetched: u64,

    /// URLs whose fetch failed
    pub fetch_failures: u64,

    /// Tasks that found their URL already claimed
    pub rejected_duplicate: u64,

    /// Tasks that arrived with no depth budget left
    pub rejected_depth: u64,

    /// Outbound links reported by successful fetches
    pub links_discovered: u64,
}

impl CrawlStatistics {
    /// URLs claimed for fetching, successful or not
    pub fn urls_claimed(&self) -> u64 {
        self.pages_fetched + self.fetch_failures
    }

    /// Tasks that reached a terminal state
    ///
    /// Equal to `tasks_spawned` once a crawl has completed.
    pub fn tasks_finished(&self) -> u64 {
        self.urls_claimed() + self.rejected_duplicate + self.rejected_depth
    }

    /// Share of claimed URLs that fetched successfully, in percent
    pub fn success_rate(&self) -> f64 {
        let claimed = self.urls_claimed();
        if claimed == 0 {
            0.0
        } else {
            (self.pages_fetched as f64 / claimed as f64) * 100.0
        }
    }
}

/// Formats statistics as the block printed after a crawl
pub fn format_statistics(stats: &CrawlStatistics, elapsed: Duration) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Statistics ===\n\n");
    out.push_str(&format!("  Tasks spawned: {}\n", stats.tasks_spawned));
    out.push_str(&format!("  Pages fetched: {}\n", stats.pages_fetched));
    out.push_str(&format!("  Fetch failures: {}\n", stats.fetch_failures));
    out.push_str(&format!(
        "  Rejected (already claimed): {}\n",
        stats.rejected_duplicate
    ));
    out.push_str(&format!(
        "  Rejected (depth exhausted): {}\n",
        stats.rejected_depth
    ));
    out.push_str(&format!("  Links discovered: {}\n", stats.links_discovered));

    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        stats.pages_fetched as f64 / secs
    } else {
        0.0
    };
    out.push_str(&format!("  Elapsed: {:.2}s ({:.2} pages/sec)\n\n", secs, rate));

    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} URLs fetched successfully)\n",
        stats.success_rate(),
        stats.pages_fetched,
        stats.urls_claimed()
    ));

    out
}
