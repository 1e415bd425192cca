//! Service layer for batch publication, pause/resume, deletion, and counter
//! recomputation.

use crate::batch::{
    domain::{Batch, BatchDomainError, BatchId},
    ports::{BatchRepository, BatchRepositoryError},
};
use crate::project::domain::ProjectId;
use crate::task::{
    domain::{AudioFileRef, Task, TaskDomainError},
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Service-level errors for batch lifecycle operations.
#[derive(Debug, Error)]
pub enum BatchLifecycleError {
    /// Batch domain validation failed.
    #[error(transparent)]
    Domain(#[from] BatchDomainError),
    /// Task domain validation failed.
    #[error(transparent)]
    TaskDomain(#[from] TaskDomainError),
    /// Batch repository operation failed.
    #[error(transparent)]
    Repository(#[from] BatchRepositoryError),
    /// Task repository operation failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),
    /// The referenced batch does not exist.
    #[error("batch not found: {0}")]
    NotFound(BatchId),
}

/// Result type for batch lifecycle service operations.
pub type BatchLifecycleResult<T> = Result<T, BatchLifecycleError>;

/// Batch lifecycle orchestration service.
///
/// Owns counter recomputation: every mutation that changes member task
/// status recounts from task rows in the same call, so the stored counters
/// never drift from the tasks for longer than one operation.
#[derive(Clone)]
pub struct BatchLifecycleService<B, T, C>
where
    B: BatchRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    batches: Arc<B>,
    tasks: Arc<T>,
    clock: Arc<C>,
}

impl<B, T, C> BatchLifecycleService<B, T, C>
where
    B: BatchRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new batch lifecycle service.
    #[must_use]
    pub const fn new(batches: Arc<B>, tasks: Arc<T>, clock: Arc<C>) -> Self {
        Self {
            batches,
            tasks,
            clock,
        }
    }

    /// Creates and persists a new draft batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchLifecycleError`] when the name is empty or the
    /// repository rejects persistence.
    pub async fn create(
        &self,
        project_id: ProjectId,
        name: impl Into<String> + Send,
    ) -> BatchLifecycleResult<Batch> {
        let batch = Batch::new(project_id, name, &*self.clock)?;
        self.batches.store(&batch).await?;
        info!(batch_id = %batch.id(), project_id = %project_id, "batch created");
        Ok(batch)
    }

    /// Retrieves a batch by identifier.
    ///
    /// Returns `Ok(None)` when the batch does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`BatchLifecycleError::Repository`] when persistence lookup
    /// fails.
    pub async fn find_by_id(&self, id: BatchId) -> BatchLifecycleResult<Option<Batch>> {
        Ok(self.batches.find_by_id(id).await?)
    }

    /// Adds a draft task to a batch and refreshes the batch counters.
    ///
    /// # Errors
    ///
    /// Returns [`BatchLifecycleError::NotFound`] when the batch does not
    /// exist, or a task domain error when the audio reference is empty.
    pub async fn add_task(
        &self,
        batch_id: BatchId,
        audio_file: impl Into<String> + Send,
    ) -> BatchLifecycleResult<Task> {
        let batch = self.require_batch(batch_id).await?;
        let audio_file = AudioFileRef::new(audio_file)?;
        let task = Task::new(batch.project_id(), Some(batch_id), audio_file, &*self.clock);
        self.tasks.store(&task).await?;
        self.refresh_counters(batch).await?;
        Ok(task)
    }

    /// Publishes a batch, moving its member tasks into the claim pool.
    ///
    /// # Errors
    ///
    /// Returns a domain error when the batch is empty or not a draft.
    pub async fn publish(&self, batch_id: BatchId) -> BatchLifecycleResult<Batch> {
        let mut batch = self.require_batch(batch_id).await?;
        let counters = self.tasks.counters_for_batch(batch_id).await?;
        batch.apply_counters(counters, &*self.clock);
        batch.publish(&*self.clock)?;
        let published = self
            .tasks
            .publish_batch_tasks(batch_id, self.clock.utc())
            .await?;
        self.batches.update(&batch).await?;
        info!(batch_id = %batch.id(), tasks = published, "batch published");
        Ok(batch)
    }

    /// Suspends claims on a batch.
    ///
    /// # Errors
    ///
    /// Returns a domain error when the batch is not in a claimable status.
    pub async fn pause(&self, batch_id: BatchId) -> BatchLifecycleResult<Batch> {
        let mut batch = self.require_batch(batch_id).await?;
        batch.pause(&*self.clock)?;
        self.batches.update(&batch).await?;
        info!(batch_id = %batch.id(), "batch paused");
        Ok(batch)
    }

    /// Resumes a paused batch.
    ///
    /// Counters are refreshed first so a batch whose last tasks completed
    /// while paused lands directly on `completed`.
    ///
    /// # Errors
    ///
    /// Returns a domain error when the batch is not paused.
    pub async fn resume(&self, batch_id: BatchId) -> BatchLifecycleResult<Batch> {
        let mut batch = self.require_batch(batch_id).await?;
        let counters = self.tasks.counters_for_batch(batch_id).await?;
        batch.apply_counters(counters, &*self.clock);
        batch.resume(&*self.clock)?;
        self.batches.update(&batch).await?;
        info!(batch_id = %batch.id(), status = batch.status().as_str(), "batch resumed");
        Ok(batch)
    }

    /// Deletes a batch and its member tasks.
    ///
    /// # Errors
    ///
    /// Returns [`BatchDomainError::DeleteNotPermitted`] (wrapped) unless the
    /// batch is `draft` or `completed`.
    pub async fn delete(&self, batch_id: BatchId) -> BatchLifecycleResult<()> {
        let batch = self.require_batch(batch_id).await?;
        batch.ensure_deletable()?;
        let removed = self.tasks.delete_by_batch(batch_id).await?;
        self.batches.delete(batch_id).await?;
        info!(batch_id = %batch_id, tasks = removed, "batch deleted");
        Ok(())
    }

    /// Recounts a batch's tasks and persists the refreshed counters.
    ///
    /// Auto-completes the batch when it is `in_progress` and every member
    /// task reached a completed status.
    ///
    /// # Errors
    ///
    /// Returns [`BatchLifecycleError::NotFound`] when the batch does not
    /// exist.
    pub async fn recompute(&self, batch_id: BatchId) -> BatchLifecycleResult<Batch> {
        let batch = self.require_batch(batch_id).await?;
        self.refresh_counters(batch).await
    }

    async fn refresh_counters(&self, mut batch: Batch) -> BatchLifecycleResult<Batch> {
        let counters = self.tasks.counters_for_batch(batch.id()).await?;
        batch.apply_counters(counters, &*self.clock);
        self.batches.update(&batch).await?;
        Ok(batch)
    }

    async fn require_batch(&self, batch_id: BatchId) -> BatchLifecycleResult<Batch> {
        self.batches
            .find_by_id(batch_id)
            .await?
            .ok_or(BatchLifecycleError::NotFound(batch_id))
    }
}
