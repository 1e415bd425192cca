//! In-memory batch repository for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::batch::{
    domain::{Batch, BatchId},
    ports::{BatchRepository, BatchRepositoryError, BatchRepositoryResult},
};
use crate::project::domain::ProjectId;

/// Thread-safe in-memory batch repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBatchRepository {
    state: Arc<RwLock<HashMap<BatchId, Batch>>>,
}

impl InMemoryBatchRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> BatchRepositoryResult<std::sync::RwLockReadGuard<'_, HashMap<BatchId, Batch>>> {
        self.state.read().map_err(|err| {
            BatchRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> BatchRepositoryResult<std::sync::RwLockWriteGuard<'_, HashMap<BatchId, Batch>>> {
        self.state.write().map_err(|err| {
            BatchRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl BatchRepository for InMemoryBatchRepository {
    async fn store(&self, batch: &Batch) -> BatchRepositoryResult<()> {
        let mut state = self.write()?;
        if state.contains_key(&batch.id()) {
            return Err(BatchRepositoryError::DuplicateBatch(batch.id()));
        }
        state.insert(batch.id(), batch.clone());
        Ok(())
    }

    async fn update(&self, batch: &Batch) -> BatchRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.contains_key(&batch.id()) {
            return Err(BatchRepositoryError::NotFound(batch.id()));
        }
        state.insert(batch.id(), batch.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BatchId) -> BatchRepositoryResult<Option<Batch>> {
        let state = self.read()?;
        Ok(state.get(&id).cloned())
    }

    async fn list_claimable(&self, project_id: ProjectId) -> BatchRepositoryResult<Vec<Batch>> {
        let state = self.read()?;
        let mut claimable: Vec<Batch> = state
            .values()
            .filter(|batch| batch.project_id() == project_id && batch.status().is_claimable())
            .cloned()
            .collect();
        claimable.sort_by_key(Batch::created_at);
        Ok(claimable)
    }

    async fn delete(&self, id: BatchId) -> BatchRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .remove(&id)
            .map(|_| ())
            .ok_or(BatchRepositoryError::NotFound(id))
    }
}
