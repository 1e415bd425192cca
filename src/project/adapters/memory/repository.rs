//! In-memory project repository for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::project::{
    domain::{AnnotationDimension, Project, ProjectId, ProjectMember, UserId},
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};

/// Thread-safe in-memory project repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectRepository {
    state: Arc<RwLock<InMemoryProjectState>>,
}

#[derive(Debug, Default)]
struct InMemoryProjectState {
    projects: HashMap<ProjectId, Project>,
    dimensions: HashMap<ProjectId, Vec<AnnotationDimension>>,
    members: HashMap<(ProjectId, UserId), ProjectMember>,
}

impl InMemoryProjectRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> ProjectRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryProjectState>> {
        self.state.read().map_err(|err| {
            ProjectRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> ProjectRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryProjectState>> {
        self.state.write().map_err(|err| {
            ProjectRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut state = self.write()?;
        if state.projects.contains_key(&project.id()) {
            return Err(ProjectRepositoryError::DuplicateProject(project.id()));
        }
        state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.projects.contains_key(&project.id()) {
            return Err(ProjectRepositoryError::NotFound(project.id()));
        }
        state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        let state = self.read()?;
        Ok(state.projects.get(&id).cloned())
    }

    async fn store_dimension(
        &self,
        dimension: &AnnotationDimension,
    ) -> ProjectRepositoryResult<()> {
        let mut state = self.write()?;
        let entries = state.dimensions.entry(dimension.project_id()).or_default();
        if entries.iter().any(|existing| existing.id() == dimension.id()) {
            return Err(ProjectRepositoryError::DuplicateDimension(dimension.id()));
        }
        entries.push(dimension.clone());
        Ok(())
    }

    async fn list_dimensions(
        &self,
        project_id: ProjectId,
    ) -> ProjectRepositoryResult<Vec<AnnotationDimension>> {
        let state = self.read()?;
        Ok(state.dimensions.get(&project_id).cloned().unwrap_or_default())
    }

    async fn upsert_member(&self, member: &ProjectMember) -> ProjectRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .members
            .insert((member.project_id, member.user_id), member.clone());
        Ok(())
    }

    async fn find_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ProjectRepositoryResult<Option<ProjectMember>> {
        let state = self.read()?;
        Ok(state.members.get(&(project_id, user_id)).cloned())
    }
}
