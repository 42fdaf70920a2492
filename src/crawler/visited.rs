//! Shared record of every URL claimed during a crawl run
//!
//! [`VisitedSet::claim_if_unvisited`] is the only way a task learns whether a
//! URL is already taken. It checks and inserts under a single lock
//! acquisition, so exactly one caller ever sees `true` for a given URL.
//! Entries are only ever added.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What is known about a claimed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Claimed, fetch not finished yet
    InProgress,

    /// Fetch succeeded
    Fetched { content: String, links: Vec<String> },

    /// Fetch failed; the message is the rendered fetch error
    Failed { error: String },
}

/// One entry in the visited set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub url: String,
    pub outcome: VisitOutcome,
}

impl VisitRecord {
    fn claimed(url: &str) -> Self {
        Self {
            url: url.to_string(),
            outcome: VisitOutcome::InProgress,
        }
    }

    /// Fetched content, if the fetch succeeded
    pub fn content(&self) -> Option<&str> {
        match &self.outcome {
            VisitOutcome::Fetched { content, .. } => Some(content),
            _ => None,
        }
    }
}

/// URL → [`VisitRecord`] map shared by every task of one crawl
///
/// All methods take `&self` and are safe to call from any number of tasks.
/// The enumeration methods (`snapshot`, `records`, `failures`) are meant for
/// after the crawl's completion barrier has released.
#[derive(Debug, Default)]
pub struct VisitedSet {
    records: Mutex<HashMap<String, VisitRecord>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` if nobody has yet
    ///
    /// Returns `true` if the caller now owns the URL and must fetch it,
    /// `false` if it was already claimed and the caller must skip it.
    pub fn claim_if_unvisited(&self, url: &str) -> bool {
        match self.lock().entry(url.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(VisitRecord::claimed(url));
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Attaches fetched content and links to a claimed URL
    ///
    /// Returns `false` (and changes nothing) if `url` was never claimed.
    pub fn record(&self, url: &str, content: String, links: Vec<String>) -> bool {
        self.set_outcome(url, VisitOutcome::Fetched { content, links })
    }

    /// Marks a claimed URL as failed
    pub fn record_failure(&self, url: &str, error: String) -> bool {
        self.set_outcome(url, VisitOutcome::Failed { error })
    }

    fn set_outcome(&self, url: &str, outcome: VisitOutcome) -> bool {
        match self.lock().get_mut(url) {
            Some(record) => {
                record.outcome = outcome;
                true
            }
            None => false,
        }
    }

    /// `(url, content)` of every successfully fetched URL, sorted by URL
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut pages: Vec<(String, String)> = self
            .lock()
            .values()
            .filter_map(|record| {
                record
                    .content()
                    .map(|content| (record.url.clone(), content.to_string()))
            })
            .collect();
        pages.sort_by(|a, b| a.0.cmp(&b.0));
        pages
    }

    /// `(url, error)` of every URL whose fetch failed, sorted by URL
    pub fn failures(&self) -> Vec<(String, String)> {
        let mut failed: Vec<(String, String)> = self
            .lock()
            .values()
            .filter_map(|record| match &record.outcome {
                VisitOutcome::Failed { error } => Some((record.url.clone(), error.clone())),
                _ => None,
            })
            .collect();
        failed.sort_by(|a, b| a.0.cmp(&b.0));
        failed
    }

    /// Every claimed record, sorted by URL
    pub fn records(&self) -> Vec<VisitRecord> {
        let mut records: Vec<VisitRecord> = self.lock().values().cloned().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        records
    }

    /// Number of claimed URLs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VisitRecord>> {
        // A panicking task cannot leave the map half-updated: every write is a
        // single insert or field assignment.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
