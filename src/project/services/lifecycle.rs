//! Service layer for project configuration and lifecycle transitions.

use crate::project::{
    domain::{
        AnnotationDimension, DimensionSchema, MemberRole, Project, ProjectDomainError, ProjectId,
        ProjectMember, ProjectName, ProjectStatus, TimeBoxMinutes, UserId,
    },
    ports::{ProjectRepository, ProjectRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    name: String,
    task_time_minutes: u32,
    review_time_minutes: u32,
}

impl CreateProjectRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, task_time_minutes: u32, review_time_minutes: u32) -> Self {
        Self {
            name: name.into(),
            task_time_minutes,
            review_time_minutes,
        }
    }
}

/// Service-level errors for project lifecycle operations.
#[derive(Debug, Error)]
pub enum ProjectLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ProjectDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ProjectRepositoryError),
    /// The referenced project does not exist.
    #[error("project not found: {0}")]
    NotFound(ProjectId),
}

/// Result type for project lifecycle service operations.
pub type ProjectLifecycleResult<T> = Result<T, ProjectLifecycleError>;

/// Project lifecycle orchestration service.
#[derive(Clone)]
pub struct ProjectLifecycleService<R, C>
where
    R: ProjectRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ProjectLifecycleService<R, C>
where
    R: ProjectRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new project lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates and persists a new draft project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectLifecycleError`] when input validation fails or the
    /// repository rejects persistence.
    pub async fn create(&self, request: CreateProjectRequest) -> ProjectLifecycleResult<Project> {
        let name = ProjectName::new(request.name)?;
        let task_time = TimeBoxMinutes::new(request.task_time_minutes)?;
        let review_time = TimeBoxMinutes::new(request.review_time_minutes)?;
        let project = Project::new(name, task_time, review_time, &*self.clock);
        self.repository.store(&project).await?;
        info!(project_id = %project.id(), "project created");
        Ok(project)
    }

    /// Retrieves a project by identifier.
    ///
    /// Returns `Ok(None)` when the project does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectLifecycleError::Repository`] when persistence lookup
    /// fails.
    pub async fn find_by_id(&self, id: ProjectId) -> ProjectLifecycleResult<Option<Project>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Adds an annotation dimension to a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectLifecycleError::NotFound`] when the project does not
    /// exist, or a domain error when the dimension payload is invalid.
    pub async fn add_dimension(
        &self,
        project_id: ProjectId,
        name: impl Into<String> + Send,
        schema: DimensionSchema,
    ) -> ProjectLifecycleResult<AnnotationDimension> {
        let project = self.require_project(project_id).await?;
        let dimension = AnnotationDimension::new(project.id(), name, schema, &*self.clock)?;
        self.repository.store_dimension(&dimension).await?;
        Ok(dimension)
    }

    /// Returns the dimensions configured for a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectLifecycleError::Repository`] when persistence lookup
    /// fails.
    pub async fn list_dimensions(
        &self,
        project_id: ProjectId,
    ) -> ProjectLifecycleResult<Vec<AnnotationDimension>> {
        Ok(self.repository.list_dimensions(project_id).await?)
    }

    /// Grants (or re-grants) a user a role in a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectLifecycleError::NotFound`] when the project does not
    /// exist.
    pub async fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: MemberRole,
    ) -> ProjectLifecycleResult<ProjectMember> {
        let project = self.require_project(project_id).await?;
        let member = ProjectMember::new(project.id(), user_id, role, &*self.clock);
        self.repository.upsert_member(&member).await?;
        Ok(member)
    }

    /// Deactivates a user's membership so they can no longer claim work.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectLifecycleError::NotFound`] when the membership does
    /// not exist.
    pub async fn deactivate_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ProjectLifecycleResult<ProjectMember> {
        let mut member = self
            .repository
            .find_member(project_id, user_id)
            .await?
            .ok_or(ProjectLifecycleError::NotFound(project_id))?;
        member.deactivate();
        self.repository.upsert_member(&member).await?;
        Ok(member)
    }

    /// Activates a project, gated on at least one configured dimension.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::MissingDimensions`] (wrapped) when no
    /// dimension is configured, or an invalid-transition error from the
    /// status machine.
    pub async fn activate(&self, project_id: ProjectId) -> ProjectLifecycleResult<Project> {
        let mut project = self.require_project(project_id).await?;
        let dimension_count = self.repository.list_dimensions(project_id).await?.len();
        project.activate(dimension_count, &*self.clock)?;
        self.repository.update(&project).await?;
        info!(project_id = %project.id(), "project activated");
        Ok(project)
    }

    /// Moves a project to the requested status via the status machine.
    ///
    /// # Errors
    ///
    /// Returns an invalid-transition domain error (wrapped) when the status
    /// machine rejects the move.
    pub async fn transition(
        &self,
        project_id: ProjectId,
        target: ProjectStatus,
    ) -> ProjectLifecycleResult<Project> {
        let mut project = self.require_project(project_id).await?;
        project.transition_to(target, &*self.clock)?;
        self.repository.update(&project).await?;
        info!(project_id = %project.id(), status = target.as_str(), "project status changed");
        Ok(project)
    }

    async fn require_project(&self, project_id: ProjectId) -> ProjectLifecycleResult<Project> {
        self.repository
            .find_by_id(project_id)
            .await?
            .ok_or(ProjectLifecycleError::NotFound(project_id))
    }
}
