//! Repository port for annotations and their values.

use crate::annotation::domain::{
    Annotation, AnnotationDomainError, AnnotationId, AnnotationValue,
};
use crate::project::domain::{DimensionId, ProjectId, UserId};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for annotation repository operations.
pub type AnnotationRepositoryResult<T> = Result<T, AnnotationRepositoryError>;

/// Domain mutation applied to an annotation while the row is exclusively
/// held.
pub type AnnotationMutation =
    Box<dyn FnOnce(&mut Annotation) -> Result<(), AnnotationDomainError> + Send>;

/// Annotation persistence contract.
///
/// Covers the annotation aggregate plus its child values; both always live
/// in the same store and are written together by the workflow and review
/// services.
#[async_trait]
pub trait AnnotationRepository: Send + Sync {
    /// Stores a new annotation.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationRepositoryError::DuplicateAnnotation`] when the
    /// annotation identifier already exists.
    async fn store(&self, annotation: &Annotation) -> AnnotationRepositoryResult<()>;

    /// Finds an annotation by identifier.
    ///
    /// Returns `None` when the annotation does not exist.
    async fn find_by_id(&self, id: AnnotationId)
    -> AnnotationRepositoryResult<Option<Annotation>>;

    /// Finds an annotation attached to a task, if any.
    ///
    /// A task can accumulate one annotation per annotator when an earlier
    /// claimant skips or loses the claim; when several exist the newest is
    /// returned.
    async fn find_by_task(&self, task_id: TaskId)
    -> AnnotationRepositoryResult<Option<Annotation>>;

    /// Finds an annotator's own annotation for a task, if any.
    ///
    /// Draft lookups key on this pair so one claimant's work is never
    /// adopted by the next.
    async fn find_by_task_and_annotator(
        &self,
        task_id: TaskId,
        annotator_id: UserId,
    ) -> AnnotationRepositoryResult<Option<Annotation>>;

    /// Applies `mutation` to the annotation while holding an exclusive lock
    /// on it, then persists the annotation.
    ///
    /// The annotation is persisted even when the mutation returns an error,
    /// mirroring the task repository's guarded update.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationRepositoryError::NotFound`] when the annotation
    /// does not exist, or [`AnnotationRepositoryError::Domain`] when the
    /// mutation rejects the change.
    async fn update_locked(
        &self,
        id: AnnotationId,
        mutation: AnnotationMutation,
    ) -> AnnotationRepositoryResult<Annotation>;

    /// Returns a project's `submitted` annotations, oldest submission first,
    /// excluding the listed annotation identifiers.
    async fn list_submitted(
        &self,
        project_id: ProjectId,
        excluded: &[AnnotationId],
    ) -> AnnotationRepositoryResult<Vec<Annotation>>;

    /// Returns a project's `under_review` annotations.
    async fn list_under_review(
        &self,
        project_id: ProjectId,
    ) -> AnnotationRepositoryResult<Vec<Annotation>>;

    /// Inserts or replaces the value keyed by the value's (annotation,
    /// dimension) pair.
    async fn upsert_value(&self, value: &AnnotationValue) -> AnnotationRepositoryResult<()>;

    /// Deletes an annotation's stored values for every dimension not in
    /// `keep`.
    ///
    /// Returns the number of values removed.
    async fn delete_values_except(
        &self,
        annotation_id: AnnotationId,
        keep: &[DimensionId],
    ) -> AnnotationRepositoryResult<usize>;

    /// Returns an annotation's stored values.
    async fn list_values(
        &self,
        annotation_id: AnnotationId,
    ) -> AnnotationRepositoryResult<Vec<AnnotationValue>>;
}

/// Errors returned by annotation repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AnnotationRepositoryError {
    /// An annotation with the same identifier already exists.
    #[error("duplicate annotation identifier: {0}")]
    DuplicateAnnotation(AnnotationId),

    /// The annotation was not found.
    #[error("annotation not found: {0}")]
    NotFound(AnnotationId),

    /// A guarded mutation rejected the change.
    #[error(transparent)]
    Domain(#[from] AnnotationDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AnnotationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
