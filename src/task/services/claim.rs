//! Claim/assignment engine.
//!
//! Orchestrates the task claim lifecycle: queue selection, time-boxed
//! claims, explicit skips, and expiry release. Claim mutations run through
//! the repository's guarded update so concurrent claimants serialize on the
//! task row; the loser sees a conflict and re-polls.

use crate::batch::{
    domain::{Batch, BatchId, BatchStatus},
    ports::{BatchRepository, BatchRepositoryError},
};
use crate::project::{
    domain::{Project, ProjectId, UserId},
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::task::{
    domain::{SkipActivity, SkipReason, SkipTarget, Task, TaskDomainError, TaskId},
    ports::{SkipLedger, SkipLedgerError, TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::info;

/// Service-level errors for claim engine operations.
#[derive(Debug, Error)]
pub enum ClaimEngineError {
    /// A claim state machine guard rejected the operation.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The acting user is not an active annotator in the project.
    #[error("user {user_id} may not claim tasks in project {project_id}")]
    PermissionDenied {
        /// Project being claimed in.
        project_id: ProjectId,
        /// User attempting the claim.
        user_id: UserId,
    },
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The referenced project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// Task repository operation failed.
    #[error(transparent)]
    TaskRepository(TaskRepositoryError),
    /// Batch repository operation failed.
    #[error(transparent)]
    BatchRepository(#[from] BatchRepositoryError),
    /// Project repository operation failed.
    #[error(transparent)]
    ProjectRepository(#[from] ProjectRepositoryError),
    /// Skip ledger operation failed.
    #[error(transparent)]
    SkipLedger(#[from] SkipLedgerError),
}

impl From<TaskRepositoryError> for ClaimEngineError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::Domain(domain) => Self::Domain(domain),
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            other => Self::TaskRepository(other),
        }
    }
}

/// Result type for claim engine operations.
pub type ClaimEngineResult<T> = Result<T, ClaimEngineError>;

/// Claim/assignment engine service.
#[derive(Clone)]
pub struct ClaimEngineService<T, B, P, S, C>
where
    T: TaskRepository,
    B: BatchRepository,
    P: ProjectRepository,
    S: SkipLedger,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    batches: Arc<B>,
    projects: Arc<P>,
    skips: Arc<S>,
    clock: Arc<C>,
}

impl<T, B, P, S, C> ClaimEngineService<T, B, P, S, C>
where
    T: TaskRepository,
    B: BatchRepository,
    P: ProjectRepository,
    S: SkipLedger,
    C: Clock + Send + Sync,
{
    /// Creates a new claim engine service.
    #[must_use]
    pub const fn new(
        tasks: Arc<T>,
        batches: Arc<B>,
        projects: Arc<P>,
        skips: Arc<S>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            batches,
            projects,
            skips,
            clock,
        }
    }

    /// Returns the task the user should work on next.
    ///
    /// An active unexpired claim is resumed as-is; an expired one is
    /// released first. Otherwise the oldest `pending` task in a claimable
    /// batch is offered, excluding tasks the user has skipped. The offered
    /// task is not claimed until [`ClaimEngineService::open`] is called.
    ///
    /// Returns `Ok(None)` when no eligible task exists.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimEngineError::PermissionDenied`] when the user is not
    /// an active annotator in the project.
    pub async fn next(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ClaimEngineResult<Option<Task>> {
        self.require_annotator(project_id, user_id).await?;
        let now = self.clock.utc();
        if let Some(task) = self.tasks.find_active_claim(project_id, user_id).await? {
            if task.is_expired(now) {
                self.release_one(task.id(), now).await?;
            } else {
                return Ok(Some(task));
            }
        }
        let batch_ids: Vec<BatchId> = self
            .batches
            .list_claimable(project_id)
            .await?
            .iter()
            .map(Batch::id)
            .collect();
        if batch_ids.is_empty() {
            return Ok(None);
        }
        let excluded = self.skips.skipped_tasks(project_id, user_id).await?;
        Ok(self
            .tasks
            .find_oldest_claimable(project_id, &batch_ids, &excluded)
            .await?)
    }

    /// Claims a task for the user, or marks work on an existing claim as
    /// started.
    ///
    /// A fresh claim is time-boxed by the project's task time box and moves
    /// the owning batch from `published` to `in_progress`.
    ///
    /// # Errors
    ///
    /// - [`ClaimEngineError::PermissionDenied`] when the user is not an
    ///   active annotator.
    /// - [`TaskDomainError::NotClaimant`] (wrapped) when another user holds
    ///   the claim.
    /// - [`TaskDomainError::ClaimConflict`] (wrapped) when the claim race
    ///   was lost to a status with no holder.
    /// - [`TaskDomainError::ClaimExpired`] (wrapped) when the user's own
    ///   claim expired; the task returns to the pool.
    pub async fn open(&self, task_id: TaskId, user_id: UserId) -> ClaimEngineResult<Task> {
        let task = self.require_task(task_id).await?;
        let project = self.require_project(task.project_id()).await?;
        self.require_annotator(project.id(), user_id).await?;
        let time_box = project.task_time().duration();
        let now = self.clock.utc();
        let task = self
            .tasks
            .update_locked(task_id, Box::new(move |task| task.open(user_id, time_box, now)))
            .await?;
        self.begin_batch_progress(task.batch_id()).await?;
        info!(task_id = %task_id, user_id = %user_id, "task opened");
        Ok(task)
    }

    /// Skips a claimed task: records a ledger entry and returns the task to
    /// the pool.
    ///
    /// The ledger keeps the task out of this user's future queue results.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptySkipReason`] (wrapped) before any
    /// mutation when the reason is blank, or a claim guard error when the
    /// user does not hold the claim.
    pub async fn skip(
        &self,
        task_id: TaskId,
        user_id: UserId,
        reason: impl Into<String> + Send,
        description: Option<String>,
    ) -> ClaimEngineResult<Task> {
        let reason = SkipReason::new(reason)?;
        let task = self.require_task(task_id).await?;
        self.require_annotator(task.project_id(), user_id).await?;
        let now = self.clock.utc();
        // The exclusion is recorded before the release so the task can
        // never be re-offered to the skipper.
        let activity = SkipActivity::new(
            task.project_id(),
            user_id,
            SkipTarget::Task(task_id),
            reason,
            description,
            now,
        );
        self.skips.append(&activity).await?;
        let task = self
            .tasks
            .update_locked(task_id, Box::new(move |task| task.skip_by(user_id, now)))
            .await?;
        info!(task_id = %task_id, user_id = %user_id, "task skipped");
        Ok(task)
    }

    /// Releases every expired claim in a project.
    ///
    /// Expiry is otherwise detected lazily on access; this sweep exists for
    /// host-scheduled reconciliation. Returns the number of claims released.
    ///
    /// # Errors
    ///
    /// Returns a repository error when lookup or release fails.
    pub async fn release_expired(&self, project_id: ProjectId) -> ClaimEngineResult<usize> {
        let now = self.clock.utc();
        let expired = self.tasks.find_expired_claims(project_id, now).await?;
        let mut released = 0;
        for task in expired {
            if self.release_one(task.id(), now).await? {
                released += 1;
            }
        }
        if released > 0 {
            info!(project_id = %project_id, released, "expired claims released");
        }
        Ok(released)
    }

    /// Releases one expired claim under the row lock.
    ///
    /// Returns whether a reset actually happened; a task already released
    /// by a concurrent sweep is left alone.
    async fn release_one(&self, task_id: TaskId, now: DateTime<Utc>) -> ClaimEngineResult<bool> {
        let reset = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&reset);
        self.tasks
            .update_locked(
                task_id,
                Box::new(move |task| {
                    flag.store(task.handle_expiration(now), Ordering::Relaxed);
                    Ok(())
                }),
            )
            .await?;
        Ok(reset.load(Ordering::Relaxed))
    }

    async fn begin_batch_progress(&self, batch_id: Option<BatchId>) -> ClaimEngineResult<()> {
        let Some(batch_id) = batch_id else {
            return Ok(());
        };
        let Some(mut batch) = self.batches.find_by_id(batch_id).await? else {
            return Ok(());
        };
        if batch.status() == BatchStatus::Published && batch.begin_progress(&*self.clock).is_ok() {
            self.batches.update(&batch).await?;
        }
        Ok(())
    }

    async fn require_annotator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ClaimEngineResult<()> {
        let member = self.projects.find_member(project_id, user_id).await?;
        match member {
            Some(member) if member.active && member.role.can_annotate() => Ok(()),
            _ => Err(ClaimEngineError::PermissionDenied {
                project_id,
                user_id,
            }),
        }
    }

    async fn require_task(&self, task_id: TaskId) -> ClaimEngineResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(ClaimEngineError::TaskNotFound(task_id))
    }

    async fn require_project(&self, project_id: ProjectId) -> ClaimEngineResult<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or(ClaimEngineError::ProjectNotFound(project_id))
    }
}
