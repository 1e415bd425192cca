//! Repository port for reviews and their correction records.

use crate::annotation::domain::AnnotationId;
use crate::project::domain::{ProjectId, UserId};
use crate::review::domain::{Review, ReviewChange, ReviewDomainError, ReviewId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for review repository operations.
pub type ReviewRepositoryResult<T> = Result<T, ReviewRepositoryError>;

/// Domain mutation applied to a review while the row is exclusively held.
pub type ReviewMutation = Box<dyn FnOnce(&mut Review) -> Result<(), ReviewDomainError> + Send>;

/// Review persistence contract.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Stores a new review.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewRepositoryError::DuplicateReview`] when the review
    /// identifier already exists.
    async fn store(&self, review: &Review) -> ReviewRepositoryResult<()>;

    /// Finds a review by identifier.
    ///
    /// Returns `None` when the review does not exist.
    async fn find_by_id(&self, id: ReviewId) -> ReviewRepositoryResult<Option<Review>>;

    /// Applies `mutation` to the review while holding an exclusive lock on
    /// it, then persists the review.
    ///
    /// The review is persisted even when the mutation returns an error,
    /// mirroring the task repository's guarded update.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewRepositoryError::NotFound`] when the review does not
    /// exist, or [`ReviewRepositoryError::Domain`] when the mutation rejects
    /// the change.
    async fn update_locked(
        &self,
        id: ReviewId,
        mutation: ReviewMutation,
    ) -> ReviewRepositoryResult<Review>;

    /// Finds the reviewer's open review within a project, if any.
    ///
    /// At most one review per (project, reviewer) is open at a time.
    async fn find_open_for_reviewer(
        &self,
        project_id: ProjectId,
        reviewer_id: UserId,
    ) -> ReviewRepositoryResult<Option<Review>>;

    /// Finds the open review holding an annotation, if any.
    ///
    /// At most one review per annotation is open at a time; an
    /// `under_review` annotation with no open review is stalled and must be
    /// returned to the queue.
    async fn find_open_for_annotation(
        &self,
        annotation_id: AnnotationId,
    ) -> ReviewRepositoryResult<Option<Review>>;

    /// Appends a correction record.
    async fn append_change(&self, change: &ReviewChange) -> ReviewRepositoryResult<()>;

    /// Returns a review's correction records, oldest first.
    async fn list_changes(&self, review_id: ReviewId) -> ReviewRepositoryResult<Vec<ReviewChange>>;
}

/// Errors returned by review repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ReviewRepositoryError {
    /// A review with the same identifier already exists.
    #[error("duplicate review identifier: {0}")]
    DuplicateReview(ReviewId),

    /// The review was not found.
    #[error("review not found: {0}")]
    NotFound(ReviewId),

    /// A guarded mutation rejected the change.
    #[error(transparent)]
    Domain(#[from] ReviewDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ReviewRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
