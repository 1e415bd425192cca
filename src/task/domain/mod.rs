//! Domain model for the task claim lifecycle.
//!
//! The task aggregate owns the claim state machine: at most one user holds
//! an active claim, claims carry an expiry timestamp, and the only paths
//! back to `pending` are an explicit skip or expiry. Terminal statuses are
//! unreachable by either.

mod error;
mod ids;
mod skip;
mod task;

pub use error::{ParseSkipTargetError, ParseTaskStatusError, TaskDomainError};
pub use ids::{SkipActivityId, TaskId};
pub use skip::{SkipActivity, SkipReason, SkipTarget};
pub use task::{AudioFileRef, PersistedTaskData, Task, TaskStatus};
