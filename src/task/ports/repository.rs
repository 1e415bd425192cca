//! Repository port for task persistence and guarded claim mutation.

use crate::batch::domain::{BatchCounters, BatchId};
use crate::project::domain::{ProjectId, UserId};
use crate::task::domain::{Task, TaskDomainError, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Domain mutation applied to a task while the row is exclusively held.
///
/// Boxed so implementations can move it into a blocking transaction.
pub type TaskMutation = Box<dyn FnOnce(&mut Task) -> Result<(), TaskDomainError> + Send>;

/// Task persistence contract.
///
/// Claim mutations go through [`TaskRepository::update_locked`] so that the
/// read-check-write of the claim state machine is atomic against concurrent
/// claimants. Everything else is plain keyed access.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task
    /// identifier already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Applies `mutation` to the task while holding an exclusive lock on it,
    /// then persists the task.
    ///
    /// The task is persisted even when the mutation returns an error:
    /// mutations that fail leave the aggregate either untouched or
    /// deliberately self-healed (an expired claim resets to `pending` before
    /// the error surfaces), and both outcomes must reach storage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist, or [`TaskRepositoryError::Domain`] when the mutation rejects
    /// the change.
    async fn update_locked(
        &self,
        id: TaskId,
        mutation: TaskMutation,
    ) -> TaskRepositoryResult<Task>;

    /// Finds the task currently claimed by `user` within a project, if any.
    ///
    /// At most one task per (project, user) carries an active claim.
    async fn find_active_claim(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> TaskRepositoryResult<Option<Task>>;

    /// Finds the oldest `pending` task of the project within the given
    /// batches, excluding the listed task identifiers.
    ///
    /// Ordered by creation time so the queue drains first-in first-out.
    /// Returns `None` when no eligible task exists.
    async fn find_oldest_claimable(
        &self,
        project_id: ProjectId,
        batch_ids: &[BatchId],
        excluded: &[TaskId],
    ) -> TaskRepositoryResult<Option<Task>>;

    /// Returns the tasks of a project whose active claim expired before
    /// `now`.
    async fn find_expired_claims(
        &self,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Recounts a batch's tasks by status.
    async fn counters_for_batch(&self, batch_id: BatchId) -> TaskRepositoryResult<BatchCounters>;

    /// Moves every `draft` task of a batch to `pending`.
    ///
    /// Returns the number of tasks published.
    async fn publish_batch_tasks(
        &self,
        batch_id: BatchId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<usize>;

    /// Deletes all tasks belonging to a batch.
    ///
    /// Returns the number of tasks removed.
    async fn delete_by_batch(&self, batch_id: BatchId) -> TaskRepositoryResult<usize>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A guarded mutation rejected the change.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
