/// Task state definitions for tracking a crawl task through its lifecycle
///
/// A task is born `Pending` and ends in either `Done` or `Rejected`.
use crate::CrawlError;
use std::fmt;

/// Represents the current state of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Task has been dispatched but has not yet checked depth or claimed its URL
    Pending,

    /// Task owns its URL in the visited set
    Claimed,

    /// Task is waiting on the fetcher
    Fetching,

    /// Task is dispatching child tasks for the links it found
    Expanding,

    // ===== Terminal States =====
    /// Task fetched (or failed to fetch) its URL and dispatched all children
    Done,

    /// Task did nothing: depth budget exhausted or URL already claimed
    Rejected,
}

/// Why a task was rejected before doing any work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Remaining depth was zero on arrival
    DepthExhausted,

    /// Another task claimed the URL first
    AlreadyClaimed,
}

impl TaskState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Rejected)
    }

    /// Returns true if this is an active state
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// ```text
    /// Pending -> Claimed -> Fetching -> Expanding -> Done
    ///    |                     |
    ///    +-> Rejected          +-> Done   (fetch failed)
    /// ```
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Claimed)
                | (Self::Pending, Self::Rejected)
                | (Self::Claimed, Self::Fetching)
                | (Self::Fetching, Self::Expanding)
                | (Self::Fetching, Self::Done)
                | (Self::Expanding, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Fetching => "fetching",
            Self::Expanding => "expanding",
            Self::Done => "done",
            Self::Rejected => "rejected",
        }
    }

    /// Returns all possible task states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Claimed,
            Self::Fetching,
            Self::Expanding,
            Self::Done,
            Self::Rejected,
        ]
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthExhausted => write!(f, "depth exhausted"),
            Self::AlreadyClaimed => write!(f, "already claimed"),
        }
    }
}

/// Checked cursor over a task's state
///
/// Every move goes through [`TaskState::can_transition_to`]; an illegal move
/// leaves the state unchanged and returns [`CrawlError::InvalidTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLifecycle {
    state: TaskState,
}

impl TaskLifecycle {
    pub fn new() -> Self {
        Self {
            state: TaskState::Pending,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Moves to `next`, failing if the transition is not allowed
    pub fn advance(&mut self, next: TaskState) -> Result<(), CrawlError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

impl Default for TaskLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
