//! Error types for task domain validation and parsing.

use super::TaskId;
use crate::project::domain::UserId;
use thiserror::Error;

/// Errors returned while constructing or mutating task domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The audio file reference is empty after trimming.
    #[error("audio file reference must not be empty")]
    EmptyAudioFile,

    /// The skip reason is empty after trimming.
    #[error("skip reason must not be empty")]
    EmptySkipReason,

    /// The requested status change is not permitted by the state machine.
    #[error("invalid task state transition for {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task whose transition was rejected.
        task_id: TaskId,
        /// Status the task currently holds.
        from: &'static str,
        /// Status that was requested.
        to: &'static str,
    },

    /// The task is held by another user or is otherwise not claimable; the
    /// caller should re-poll the queue.
    #[error("task {0} is not claimable")]
    ClaimConflict(TaskId),

    /// The claim's time box elapsed; the task has been reset to pending.
    #[error("claim on task {0} expired")]
    ClaimExpired(TaskId),

    /// The acting user does not hold the task's active claim.
    #[error("user {user_id} does not hold the claim on task {task_id}")]
    NotClaimant {
        /// Task being operated on.
        task_id: TaskId,
        /// User attempting the operation.
        user_id: UserId,
    },

    /// The task has no active claim to operate on.
    #[error("task {0} has no active claim")]
    ClaimNotActive(TaskId),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing skip target kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown skip activity type: {0}")]
pub struct ParseSkipTargetError(pub String);
