//! In-memory task repository for tests and embedding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::batch::domain::{BatchCounters, BatchId};
use crate::project::domain::{ProjectId, UserId};
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::{TaskMutation, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Guarded mutations hold the write lock for their full read-check-write,
/// which gives the same atomicity as the row lock the `PostgreSQL` adapter
/// takes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<std::sync::RwLockReadGuard<'_, HashMap<TaskId, Task>>> {
        self.state
            .read()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(
        &self,
    ) -> TaskRepositoryResult<std::sync::RwLockWriteGuard<'_, HashMap<TaskId, Task>>> {
        self.state
            .write()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.get(&id).cloned())
    }

    async fn update_locked(
        &self,
        id: TaskId,
        mutation: TaskMutation,
    ) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let task = state.get_mut(&id).ok_or(TaskRepositoryError::NotFound(id))?;
        // The mutation runs against the stored aggregate, so its effects
        // persist even when it returns an error (expiry self-heal).
        let outcome = mutation(task);
        let snapshot = task.clone();
        outcome?;
        Ok(snapshot)
    }

    async fn find_active_claim(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state
            .values()
            .find(|task| {
                task.project_id() == project_id
                    && task.assigned_to() == Some(user_id)
                    && task.status().is_active_claim()
            })
            .cloned())
    }

    async fn find_oldest_claimable(
        &self,
        project_id: ProjectId,
        batch_ids: &[BatchId],
        excluded: &[TaskId],
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state
            .values()
            .filter(|task| {
                task.project_id() == project_id
                    && task.status() == TaskStatus::Pending
                    && task
                        .batch_id()
                        .is_some_and(|batch_id| batch_ids.contains(&batch_id))
                    && !excluded.contains(&task.id())
            })
            .min_by_key(|task| (task.created_at(), task.id()))
            .cloned())
    }

    async fn find_expired_claims(
        &self,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .values()
            .filter(|task| task.project_id() == project_id && task.is_expired(now))
            .cloned()
            .collect())
    }

    async fn counters_for_batch(&self, batch_id: BatchId) -> TaskRepositoryResult<BatchCounters> {
        let state = self.read()?;
        let mut counters = BatchCounters::default();
        for task in state
            .values()
            .filter(|task| task.batch_id() == Some(batch_id))
        {
            counters.total_tasks += 1;
            if task.status().is_completed() {
                counters.completed_tasks += 1;
            }
            match task.status() {
                TaskStatus::Approved => counters.approved_tasks += 1,
                TaskStatus::Rejected => counters.rejected_tasks += 1,
                _ => {}
            }
        }
        Ok(counters)
    }

    async fn publish_batch_tasks(
        &self,
        batch_id: BatchId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<usize> {
        let mut state = self.write()?;
        let mut published = 0;
        for task in state
            .values_mut()
            .filter(|task| task.batch_id() == Some(batch_id) && task.status() == TaskStatus::Draft)
        {
            task.publish(now)?;
            published += 1;
        }
        Ok(published)
    }

    async fn delete_by_batch(&self, batch_id: BatchId) -> TaskRepositoryResult<usize> {
        let mut state = self.write()?;
        let before = state.len();
        state.retain(|_, task| task.batch_id() != Some(batch_id));
        Ok(before - state.len())
    }
}
