//! Review engine.
//!
//! Hands out submitted annotations to reviewers oldest-first, applies
//! reviewer corrections with an audit trail, and finalizes the annotation
//! and its task together. Reviews are time-boxed like task claims: an
//! expired review is abandoned on next access and its annotation returns to
//! the queue.

use crate::annotation::{
    domain::{Annotation, AnnotationDomainError, AnnotationId, AnnotationValue, DimensionAnswer},
    ports::{AnnotationRepository, AnnotationRepositoryError},
};
use crate::batch::{
    domain::{Batch, BatchId},
    ports::{BatchRepository, BatchRepositoryError},
};
use crate::project::{
    domain::{DimensionId, Project, ProjectId, UserId},
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::review::{
    domain::{Review, ReviewAction, ReviewChange, ReviewDomainError, ReviewId},
    ports::{ReviewRepository, ReviewRepositoryError},
};
use crate::task::{
    domain::{SkipActivity, SkipReason, SkipTarget, TaskDomainError, TaskId},
    ports::{SkipLedger, SkipLedgerError, TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// One reviewer correction applied during approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCorrection {
    /// Dimension being corrected.
    pub dimension_id: DimensionId,
    /// Replacement answer.
    pub corrected: DimensionAnswer,
    /// Optional reason for the correction.
    pub reason: Option<String>,
}

/// Service-level errors for review engine operations.
#[derive(Debug, Error)]
pub enum ReviewEngineError {
    /// A review state machine guard rejected the operation.
    #[error(transparent)]
    Domain(#[from] ReviewDomainError),
    /// An annotation state machine guard rejected the operation.
    #[error(transparent)]
    AnnotationDomain(AnnotationDomainError),
    /// A task state machine guard rejected the operation.
    #[error(transparent)]
    TaskDomain(TaskDomainError),
    /// The annotation was claimed by another reviewer between queue
    /// selection and the claim; re-poll the queue.
    #[error("annotation {0} is already being reviewed")]
    ReviewConflict(AnnotationId),
    /// The acting user is not an active reviewer in the project.
    #[error("user {user_id} may not review in project {project_id}")]
    PermissionDenied {
        /// Project being reviewed in.
        project_id: ProjectId,
        /// User attempting the review.
        user_id: UserId,
    },
    /// The referenced review does not exist.
    #[error("review not found: {0}")]
    ReviewNotFound(ReviewId),
    /// The referenced annotation does not exist.
    #[error("annotation not found: {0}")]
    AnnotationNotFound(AnnotationId),
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The referenced project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// Review repository operation failed.
    #[error(transparent)]
    Repository(ReviewRepositoryError),
    /// Annotation repository operation failed.
    #[error(transparent)]
    AnnotationRepository(AnnotationRepositoryError),
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

impl From<ReviewRepositoryError> for ReviewEngineError {
    fn from(err: ReviewRepositoryError) -> Self {
        match err {
            ReviewRepositoryError::Domain(domain) => Self::Domain(domain),
            ReviewRepositoryError::NotFound(review_id) => Self::ReviewNotFound(review_id),
            other => Self::Repository(other),
        }
    }
}

impl From<AnnotationRepositoryError> for ReviewEngineError {
    fn from(err: AnnotationRepositoryError) -> Self {
        match err {
            AnnotationRepositoryError::Domain(domain) => Self::AnnotationDomain(domain),
            AnnotationRepositoryError::NotFound(annotation_id) => {
                Self::AnnotationNotFound(annotation_id)
            }
            other => Self::AnnotationRepository(other),
        }
    }
}

impl From<TaskRepositoryError> for ReviewEngineError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::Domain(domain) => Self::TaskDomain(domain),
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            other => Self::TaskRepository(other),
        }
    }
}

/// Result type for review engine operations.
pub type ReviewEngineResult<T> = Result<T, ReviewEngineError>;

/// Review engine orchestration service.
#[derive(Clone)]
pub struct ReviewEngineService<R, A, T, B, P, S, C>
where
    R: ReviewRepository,
    A: AnnotationRepository,
    T: TaskRepository,
    B: BatchRepository,
    P: ProjectRepository,
    S: SkipLedger,
    C: Clock + Send + Sync,
{
    reviews: Arc<R>,
    annotations: Arc<A>,
    tasks: Arc<T>,
    batches: Arc<B>,
    projects: Arc<P>,
    skips: Arc<S>,
    clock: Arc<C>,
}

impl<R, A, T, B, P, S, C> ReviewEngineService<R, A, T, B, P, S, C>
where
    R: ReviewRepository,
    A: AnnotationRepository,
    T: TaskRepository,
    B: BatchRepository,
    P: ProjectRepository,
    S: SkipLedger,
    C: Clock + Send + Sync,
{
    /// Creates a new review engine service.
    #[must_use]
    pub const fn new(
        reviews: Arc<R>,
        annotations: Arc<A>,
        tasks: Arc<T>,
        batches: Arc<B>,
        projects: Arc<P>,
        skips: Arc<S>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            reviews,
            annotations,
            tasks,
            batches,
            projects,
            skips,
            clock,
        }
    }

    /// Returns the review the user should work on next, opening one if
    /// needed.
    ///
    /// An open unexpired review is resumed; an expired one is abandoned and
    /// its annotation returned to the queue first. Stalled annotations
    /// (under review with no open review, or held by an expired review) are
    /// reclaimed before selection. Otherwise the oldest `submitted`
    /// annotation on a claimable-batch task is taken, excluding annotations
    /// the reviewer has skipped and the reviewer's own work.
    ///
    /// Returns `Ok(None)` when no eligible annotation exists.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewEngineError::PermissionDenied`] when the user is not
    /// an active reviewer in the project.
    pub async fn next(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ReviewEngineResult<Option<Review>> {
        self.require_reviewer(project_id, user_id).await?;
        let now = self.clock.utc();
        if let Some(review) = self
            .reviews
            .find_open_for_reviewer(project_id, user_id)
            .await?
        {
            if review.is_expired(now) {
                self.reset_review(&review, now).await?;
            } else {
                return Ok(Some(review));
            }
        }
        self.reclaim_stalled(project_id, now).await?;
        let project = self.require_project(project_id).await?;
        let candidate = self.select_candidate(&project, user_id).await?;
        let Some(annotation) = candidate else {
            return Ok(None);
        };
        // Locking the annotation decides races between reviewers; the loser
        // sees a conflict and re-polls.
        let claimed = self
            .annotations
            .update_locked(
                annotation.id(),
                Box::new(move |annotation| annotation.begin_review(now)),
            )
            .await;
        if let Err(err) = claimed {
            return Err(match err {
                AnnotationRepositoryError::Domain(
                    AnnotationDomainError::InvalidStateTransition { .. },
                ) => ReviewEngineError::ReviewConflict(annotation.id()),
                other => other.into(),
            });
        }
        let review = Review::new(
            annotation.id(),
            project_id,
            user_id,
            project.review_time().duration(),
            now,
        );
        self.reviews.store(&review).await?;
        info!(review_id = %review.id(), annotation_id = %annotation.id(), "review opened");
        Ok(Some(review))
    }

    /// Approves a reviewed annotation, applying any corrections.
    ///
    /// Each correction is compared with the stored value; differing values
    /// are overwritten and an audit record is appended. The review, the
    /// annotation, and the task are finalized together, and the owning
    /// batch's counters are refreshed.
    ///
    /// # Errors
    ///
    /// - [`ReviewDomainError::AlreadyClosed`] (wrapped) on a second approve.
    /// - [`ReviewDomainError::ReviewExpired`] (wrapped) when the time box
    ///   elapsed; the annotation returns to the queue.
    /// - [`ReviewDomainError::NotReviewOwner`] (wrapped) when `user_id` does
    ///   not own the review.
    pub async fn approve(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        feedback: Option<String>,
        corrections: Vec<ReviewCorrection>,
    ) -> ReviewEngineResult<Review> {
        let review = self.require_review(review_id).await?;
        review.ensure_owned_by(user_id)?;
        let now = self.clock.utc();
        let finalized = self
            .reviews
            .update_locked(
                review_id,
                Box::new(move |review| review.finalize(ReviewAction::Approved, feedback, now)),
            )
            .await;
        let review = match finalized {
            Ok(review) => review,
            Err(ReviewRepositoryError::Domain(ReviewDomainError::ReviewExpired(id))) => {
                self.revert_annotation(review.annotation_id(), now).await?;
                return Err(ReviewEngineError::Domain(ReviewDomainError::ReviewExpired(
                    id,
                )));
            }
            Err(err) => return Err(err.into()),
        };
        self.apply_corrections(&review, corrections, now).await?;
        let annotation = self
            .annotations
            .update_locked(
                review.annotation_id(),
                Box::new(move |annotation| annotation.approve(now)),
            )
            .await?;
        let task = self
            .tasks
            .update_locked(annotation.task_id(), Box::new(move |task| task.approve(now)))
            .await?;
        self.refresh_batch(task.batch_id()).await?;
        info!(review_id = %review.id(), annotation_id = %annotation.id(), "review approved");
        Ok(review)
    }

    /// Skips an open review: the review is abandoned, the annotation
    /// returns to the queue, and a ledger entry keeps it away from this
    /// reviewer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptySkipReason`] (wrapped) before any
    /// mutation when the reason is blank, or
    /// [`ReviewDomainError::AlreadyClosed`] (wrapped) when the review was
    /// already finalized or abandoned.
    pub async fn skip(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        reason: impl Into<String> + Send,
        description: Option<String>,
    ) -> ReviewEngineResult<Review> {
        let reason = SkipReason::new(reason).map_err(ReviewEngineError::TaskDomain)?;
        let review = self.require_review(review_id).await?;
        review.ensure_owned_by(user_id)?;
        let now = self.clock.utc();
        // The exclusion is recorded before the review closes so the
        // annotation can never be re-offered to the skipper.
        let activity = SkipActivity::new(
            review.project_id(),
            user_id,
            SkipTarget::Review(review.annotation_id()),
            reason,
            description,
            now,
        );
        self.skips.append(&activity).await?;
        let review = self
            .reviews
            .update_locked(review_id, Box::new(move |review| review.abandon(now)))
            .await?;
        self.revert_annotation(review.annotation_id(), now).await?;
        info!(review_id = %review.id(), user_id = %user_id, "review skipped");
        Ok(review)
    }

    /// Picks the oldest reviewable annotation for the user.
    async fn select_candidate(
        &self,
        project: &Project,
        user_id: UserId,
    ) -> ReviewEngineResult<Option<Annotation>> {
        let excluded = self
            .skips
            .skipped_annotations(project.id(), user_id)
            .await?;
        let submitted = self
            .annotations
            .list_submitted(project.id(), &excluded)
            .await?;
        let claimable: Vec<BatchId> = self
            .batches
            .list_claimable(project.id())
            .await?
            .iter()
            .map(Batch::id)
            .collect();
        for annotation in submitted {
            if annotation.annotator_id() == user_id {
                continue;
            }
            let Some(task) = self.tasks.find_by_id(annotation.task_id()).await? else {
                continue;
            };
            if task
                .batch_id()
                .is_some_and(|batch_id| claimable.contains(&batch_id))
            {
                return Ok(Some(annotation));
            }
        }
        Ok(None)
    }

    /// Returns stalled annotations to the queue.
    ///
    /// An annotation stuck `under_review` is either held by an expired
    /// review whose owner never came back, or by no open review at all when
    /// a finalization sequence was interrupted between commits. Both are
    /// reverted to `submitted` so the queue never loses work.
    async fn reclaim_stalled(
        &self,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> ReviewEngineResult<()> {
        for annotation in self.annotations.list_under_review(project_id).await? {
            match self.reviews.find_open_for_annotation(annotation.id()).await? {
                Some(review) if review.is_expired(now) => {
                    self.reset_review(&review, now).await?;
                }
                Some(_) => {}
                None => {
                    self.revert_annotation(annotation.id(), now).await?;
                    info!(annotation_id = %annotation.id(), "stalled annotation requeued");
                }
            }
        }
        Ok(())
    }

    /// Abandons an expired review and returns its annotation to the queue.
    async fn reset_review(&self, review: &Review, now: DateTime<Utc>) -> ReviewEngineResult<()> {
        self.reviews
            .update_locked(review.id(), Box::new(move |review| review.abandon(now)))
            .await?;
        self.revert_annotation(review.annotation_id(), now).await?;
        info!(review_id = %review.id(), "expired review abandoned");
        Ok(())
    }

    async fn revert_annotation(
        &self,
        annotation_id: AnnotationId,
        now: DateTime<Utc>,
    ) -> ReviewEngineResult<()> {
        self.annotations
            .update_locked(
                annotation_id,
                Box::new(move |annotation| annotation.revert_to_submitted(now)),
            )
            .await?;
        Ok(())
    }

    async fn apply_corrections(
        &self,
        review: &Review,
        corrections: Vec<ReviewCorrection>,
        now: DateTime<Utc>,
    ) -> ReviewEngineResult<()> {
        if corrections.is_empty() {
            return Ok(());
        }
        let current: Vec<AnnotationValue> =
            self.annotations.list_values(review.annotation_id()).await?;
        for correction in corrections {
            let Some(value) = current
                .iter()
                .find(|value| value.dimension_id() == correction.dimension_id)
            else {
                continue;
            };
            if value.answer() == &correction.corrected {
                continue;
            }
            let mut updated = value.clone();
            updated.set_answer(correction.corrected.clone(), now);
            self.annotations.upsert_value(&updated).await?;
            let change = ReviewChange {
                review_id: review.id(),
                dimension_id: correction.dimension_id,
                original: value.answer().clone(),
                corrected: correction.corrected,
                reason: correction.reason,
                created_at: now,
            };
            self.reviews.append_change(&change).await?;
        }
        Ok(())
    }

    async fn refresh_batch(&self, batch_id: Option<BatchId>) -> ReviewEngineResult<()> {
        let Some(batch_id) = batch_id else {
            return Ok(());
        };
        let Some(mut batch) = self.batches.find_by_id(batch_id).await? else {
            return Ok(());
        };
        let counters = self.tasks.counters_for_batch(batch_id).await?;
        batch.apply_counters(counters, &*self.clock);
        self.batches.update(&batch).await?;
        if counters.is_fully_completed() {
            info!(batch_id = %batch_id, "batch fully completed");
        }
        Ok(())
    }

    async fn require_reviewer(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ReviewEngineResult<()> {
        let member = self.projects.find_member(project_id, user_id).await?;
        match member {
            Some(member) if member.active && member.role.can_review() => Ok(()),
            _ => Err(ReviewEngineError::PermissionDenied {
                project_id,
                user_id,
            }),
        }
    }

    async fn require_review(&self, review_id: ReviewId) -> ReviewEngineResult<Review> {
        self.reviews
            .find_by_id(review_id)
            .await?
            .ok_or(ReviewEngineError::ReviewNotFound(review_id))
    }

    async fn require_project(&self, project_id: ProjectId) -> ReviewEngineResult<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or(ReviewEngineError::ProjectNotFound(project_id))
    }
}
