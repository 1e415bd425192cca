//! Repository port for project, dimension, and membership persistence.

use crate::project::domain::{
    AnnotationDimension, DimensionId, Project, ProjectId, ProjectMember, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for project repository operations.
pub type ProjectRepositoryResult<T> = Result<T, ProjectRepositoryError>;

/// Project-context persistence contract.
///
/// Covers the project aggregate itself plus its owned dimension schema and
/// member roster; the three always live in the same store and are read
/// together by the claim and review engines.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores a new project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::DuplicateProject`] when the project
    /// identifier already exists.
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()>;

    /// Persists changes to an existing project (status, timestamps).
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::NotFound`] when the project does not
    /// exist.
    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()>;

    /// Finds a project by identifier.
    ///
    /// Returns `None` when the project does not exist.
    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>>;

    /// Stores a new annotation dimension.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::DuplicateDimension`] when the
    /// dimension identifier already exists.
    async fn store_dimension(
        &self,
        dimension: &AnnotationDimension,
    ) -> ProjectRepositoryResult<()>;

    /// Returns all dimensions configured for a project.
    async fn list_dimensions(
        &self,
        project_id: ProjectId,
    ) -> ProjectRepositoryResult<Vec<AnnotationDimension>>;

    /// Inserts or replaces a membership record keyed by (project, user).
    async fn upsert_member(&self, member: &ProjectMember) -> ProjectRepositoryResult<()>;

    /// Finds a membership record.
    ///
    /// Returns `None` when the user is not a member of the project.
    async fn find_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ProjectRepositoryResult<Option<ProjectMember>>;
}

/// Errors returned by project repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ProjectRepositoryError {
    /// A project with the same identifier already exists.
    #[error("duplicate project identifier: {0}")]
    DuplicateProject(ProjectId),

    /// A dimension with the same identifier already exists.
    #[error("duplicate dimension identifier: {0}")]
    DuplicateDimension(DimensionId),

    /// The project was not found.
    #[error("project not found: {0}")]
    NotFound(ProjectId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProjectRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
