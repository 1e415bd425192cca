//! Annotation workflow: draft saves and submission.
//!
//! Both operations share the same guard order: the caller must hold an
//! active unexpired claim on the task, and the answer payload must validate
//! against the project's dimension schema before any value is written.

use crate::annotation::{
    domain::{
        Annotation, AnnotationDomainError, AnnotationStatus, AnnotationValidationError,
        AnnotationValue, DimensionAnswer, validate_answers,
    },
    ports::{AnnotationRepository, AnnotationRepositoryError},
};
use crate::project::{
    domain::{DimensionId, UserId},
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::task::{
    domain::{Task, TaskDomainError, TaskId},
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Service-level errors for annotation workflow operations.
#[derive(Debug, Error)]
pub enum AnnotationWorkflowError {
    /// The answer payload does not match the dimension schema.
    #[error(transparent)]
    Validation(#[from] AnnotationValidationError),
    /// An annotation state machine guard rejected the operation.
    #[error(transparent)]
    Domain(#[from] AnnotationDomainError),
    /// A claim guard on the task rejected the operation.
    #[error(transparent)]
    TaskDomain(#[from] TaskDomainError),
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// Annotation repository operation failed.
    #[error(transparent)]
    Repository(AnnotationRepositoryError),
    /// Task repository operation failed.
    #[error(transparent)]
    TaskRepository(TaskRepositoryError),
    /// Project repository operation failed.
    #[error(transparent)]
    ProjectRepository(#[from] ProjectRepositoryError),
}

impl From<AnnotationRepositoryError> for AnnotationWorkflowError {
    fn from(err: AnnotationRepositoryError) -> Self {
        match err {
            AnnotationRepositoryError::Domain(domain) => Self::Domain(domain),
            other => Self::Repository(other),
        }
    }
}

impl From<TaskRepositoryError> for AnnotationWorkflowError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::Domain(domain) => Self::TaskDomain(domain),
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            other => Self::TaskRepository(other),
        }
    }
}

/// Result type for annotation workflow operations.
pub type AnnotationWorkflowResult<T> = Result<T, AnnotationWorkflowError>;

/// Annotation workflow orchestration service.
#[derive(Clone)]
pub struct AnnotationWorkflowService<A, T, P, C>
where
    A: AnnotationRepository,
    T: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    annotations: Arc<A>,
    tasks: Arc<T>,
    projects: Arc<P>,
    clock: Arc<C>,
}

impl<A, T, P, C> AnnotationWorkflowService<A, T, P, C>
where
    A: AnnotationRepository,
    T: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new annotation workflow service.
    #[must_use]
    pub const fn new(annotations: Arc<A>, tasks: Arc<T>, projects: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            annotations,
            tasks,
            projects,
            clock,
        }
    }

    /// Saves the user's in-progress answers for a task.
    ///
    /// Lazily creates the draft annotation on first save. One value row is
    /// kept per dimension present in the payload; stored values for absent
    /// dimensions are deleted.
    ///
    /// # Errors
    ///
    /// - [`TaskDomainError::ClaimExpired`] (wrapped) when the claim's time
    ///   box elapsed; the task returns to the pool and nothing is written.
    /// - [`AnnotationValidationError`] (wrapped) when the payload does not
    ///   match the dimension schema; nothing is written.
    pub async fn save_draft(
        &self,
        task_id: TaskId,
        user_id: UserId,
        answers: Vec<(DimensionId, DimensionAnswer)>,
    ) -> AnnotationWorkflowResult<Annotation> {
        let now = self.clock.utc();
        let task = self.guard_claim(task_id, user_id, now).await?;
        self.validate(&task, &answers).await?;
        let annotation = self.require_draft(&task, user_id, now).await?;
        self.write_values(&annotation, &answers, now).await?;
        Ok(annotation)
    }

    /// Submits the user's answers, moving the annotation to `submitted` and
    /// the task to `under_review`.
    ///
    /// # Errors
    ///
    /// Same guards as [`AnnotationWorkflowService::save_draft`]; the
    /// submission additionally fails when the annotation or task state
    /// machine rejects the transition.
    pub async fn submit(
        &self,
        task_id: TaskId,
        user_id: UserId,
        answers: Vec<(DimensionId, DimensionAnswer)>,
    ) -> AnnotationWorkflowResult<Annotation> {
        let now = self.clock.utc();
        let task = self.guard_claim(task_id, user_id, now).await?;
        self.validate(&task, &answers).await?;
        if let Some(existing) = self
            .annotations
            .find_by_task_and_annotator(task_id, user_id)
            .await?
        {
            // An annotation already submitted while the claim is still
            // active means an earlier submission stopped short of the task
            // transition; finish that instead of re-submitting.
            if existing.status() == AnnotationStatus::Submitted {
                self.tasks
                    .update_locked(task_id, Box::new(move |task| task.submit(user_id, now)))
                    .await?;
                info!(task_id = %task_id, annotation_id = %existing.id(), "submission resumed");
                return Ok(existing);
            }
        }
        let annotation = self.require_draft(&task, user_id, now).await?;
        self.write_values(&annotation, &answers, now).await?;
        let annotation = self
            .annotations
            .update_locked(annotation.id(), Box::new(move |annotation| annotation.submit(now)))
            .await?;
        self.tasks
            .update_locked(task_id, Box::new(move |task| task.submit(user_id, now)))
            .await?;
        info!(task_id = %task_id, annotation_id = %annotation.id(), "annotation submitted");
        Ok(annotation)
    }

    /// Returns an annotation's stored values.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationWorkflowError::Repository`] when persistence
    /// lookup fails.
    pub async fn list_values(
        &self,
        annotation: &Annotation,
    ) -> AnnotationWorkflowResult<Vec<AnnotationValue>> {
        Ok(self.annotations.list_values(annotation.id()).await?)
    }

    /// Verifies the user's claim under the row lock; an expired claim is
    /// released and surfaces as an error.
    async fn guard_claim(
        &self,
        task_id: TaskId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AnnotationWorkflowResult<Task> {
        let task = self
            .tasks
            .update_locked(
                task_id,
                Box::new(move |task| task.ensure_active_claim(user_id, now)),
            )
            .await?;
        Ok(task)
    }

    async fn validate(
        &self,
        task: &Task,
        answers: &[(DimensionId, DimensionAnswer)],
    ) -> AnnotationWorkflowResult<()> {
        let dimensions = self.projects.list_dimensions(task.project_id()).await?;
        validate_answers(&dimensions, answers)?;
        Ok(())
    }

    /// Finds or creates the user's own draft for the task.
    ///
    /// Lookup is keyed on (task, annotator): a draft left behind by an
    /// earlier claimant stays that claimant's work and is never adopted.
    async fn require_draft(
        &self,
        task: &Task,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AnnotationWorkflowResult<Annotation> {
        if let Some(annotation) = self
            .annotations
            .find_by_task_and_annotator(task.id(), user_id)
            .await?
        {
            let annotation = self
                .annotations
                .update_locked(
                    annotation.id(),
                    Box::new(move |annotation| annotation.touch_draft(now)),
                )
                .await?;
            return Ok(annotation);
        }
        let annotation = Annotation::new(task.id(), task.project_id(), user_id, now);
        self.annotations.store(&annotation).await?;
        info!(task_id = %task.id(), annotation_id = %annotation.id(), "draft annotation created");
        Ok(annotation)
    }

    async fn write_values(
        &self,
        annotation: &Annotation,
        answers: &[(DimensionId, DimensionAnswer)],
        now: DateTime<Utc>,
    ) -> AnnotationWorkflowResult<()> {
        let mut keep: Vec<DimensionId> = Vec::with_capacity(answers.len());
        for (dimension_id, answer) in answers {
            let value =
                AnnotationValue::new(annotation.id(), *dimension_id, answer.clone(), now);
            self.annotations.upsert_value(&value).await?;
            keep.push(*dimension_id);
        }
        self.annotations
            .delete_values_except(annotation.id(), &keep)
            .await?;
        Ok(())
    }
}
