//! Completion barrier counting outstanding crawl tasks
//!
//! The count goes up *before* a task is spawned and down exactly once when
//! that task finishes, whichever path it finishes on. [`CompletionBarrier::wait`]
//! resolves once the count is back at zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counts outstanding work and wakes waiters when it drains
#[derive(Debug, Default)]
pub struct CompletionBarrier {
    outstanding: AtomicUsize,
    drained: Notify,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `n` units of outstanding work
    pub fn add(&self, n: usize) {
        self.outstanding.fetch_add(n, Ordering::AcqRel);
    }

    /// Releases one unit of outstanding work
    ///
    /// Waiters are woken when this brings the count to zero. Releasing more
    /// than was added is a bug; it is logged and otherwise ignored.
    pub fn done(&self) {
        let previous = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.drained.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::error!("CompletionBarrier::done called with nothing outstanding"),
        }
    }

    /// Current number of outstanding units
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Waits until the outstanding count reaches zero
    ///
    /// Returns immediately if nothing is outstanding.
    pub async fn wait(&self) {
        loop {
            let drained = self.drained.notified();
            tokio::pin!(drained);
            // Register interest before reading the count so a `done` landing
            // in between is not missed.
            drained.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }

            drained.await;
        }
    }

    /// Adds one unit and returns a guard that releases it when dropped
    ///
    /// The guard is moved into the spawned task, so the unit is released on
    /// every exit path of that task, including a panic.
    pub fn register(self: &Arc<Self>) -> PendingTask {
        self.add(1);
        PendingTask {
            barrier: Arc::clone(self),
        }
    }
}

/// One registered unit of outstanding work
#[derive(Debug)]
#[must_use = "dropping a PendingTask releases it immediately"]
pub struct PendingTask {
    barrier: Arc<CompletionBarrier>,
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        self.barrier.done();
    }
}
