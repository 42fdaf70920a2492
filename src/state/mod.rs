//! State module for tracking crawl task progress
//!
//! # Components
//!
//! - `TaskState`: the lifecycle of a single crawl task (pending, claimed, fetching, ...)
//! - `TaskLifecycle`: a checked cursor over `TaskState` that rejects illegal transitions

mod task_state;

// Re-export main types
pub use task_state::{RejectReason, TaskLifecycle, TaskState};
