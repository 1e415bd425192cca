//! Repository port for batch persistence and claimability lookup.

use crate::batch::domain::{Batch, BatchId};
use crate::project::domain::ProjectId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for batch repository operations.
pub type BatchRepositoryResult<T> = Result<T, BatchRepositoryError>;

/// Batch persistence contract.
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Stores a new batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchRepositoryError::DuplicateBatch`] when the batch
    /// identifier already exists.
    async fn store(&self, batch: &Batch) -> BatchRepositoryResult<()>;

    /// Persists changes to an existing batch (status, counters, timestamps).
    ///
    /// # Errors
    ///
    /// Returns [`BatchRepositoryError::NotFound`] when the batch does not
    /// exist.
    async fn update(&self, batch: &Batch) -> BatchRepositoryResult<()>;

    /// Finds a batch by identifier.
    ///
    /// Returns `None` when the batch does not exist.
    async fn find_by_id(&self, id: BatchId) -> BatchRepositoryResult<Option<Batch>>;

    /// Returns the batches of a project whose status admits claims
    /// (`published` or `in_progress`).
    async fn list_claimable(&self, project_id: ProjectId) -> BatchRepositoryResult<Vec<Batch>>;

    /// Deletes a batch row.
    ///
    /// Member task cleanup is the caller's responsibility; the service
    /// deletes tasks through the task repository in the same operation.
    ///
    /// # Errors
    ///
    /// Returns [`BatchRepositoryError::NotFound`] when the batch does not
    /// exist.
    async fn delete(&self, id: BatchId) -> BatchRepositoryResult<()>;
}

/// Errors returned by batch repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BatchRepositoryError {
    /// A batch with the same identifier already exists.
    #[error("duplicate batch identifier: {0}")]
    DuplicateBatch(BatchId),

    /// The batch was not found.
    #[error("batch not found: {0}")]
    NotFound(BatchId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BatchRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
