//! In-memory annotation repository for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::annotation::{
    domain::{Annotation, AnnotationId, AnnotationStatus, AnnotationValue},
    ports::{
        AnnotationMutation, AnnotationRepository, AnnotationRepositoryError,
        AnnotationRepositoryResult,
    },
};
use crate::project::domain::{DimensionId, ProjectId, UserId};
use crate::task::domain::TaskId;

#[derive(Debug, Default)]
struct State {
    annotations: HashMap<AnnotationId, Annotation>,
    values: HashMap<(AnnotationId, DimensionId), AnnotationValue>,
}

/// Thread-safe in-memory annotation repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAnnotationRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryAnnotationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AnnotationRepositoryResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|err| {
            AnnotationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> AnnotationRepositoryResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|err| {
            AnnotationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl AnnotationRepository for InMemoryAnnotationRepository {
    async fn store(&self, annotation: &Annotation) -> AnnotationRepositoryResult<()> {
        let mut state = self.write()?;
        if state.annotations.contains_key(&annotation.id()) {
            return Err(AnnotationRepositoryError::DuplicateAnnotation(
                annotation.id(),
            ));
        }
        state.annotations.insert(annotation.id(), annotation.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: AnnotationId,
    ) -> AnnotationRepositoryResult<Option<Annotation>> {
        let state = self.read()?;
        Ok(state.annotations.get(&id).cloned())
    }

    async fn find_by_task(
        &self,
        task_id: TaskId,
    ) -> AnnotationRepositoryResult<Option<Annotation>> {
        let state = self.read()?;
        Ok(state
            .annotations
            .values()
            .filter(|annotation| annotation.task_id() == task_id)
            .max_by_key(|annotation| (annotation.created_at(), annotation.id()))
            .cloned())
    }

    async fn find_by_task_and_annotator(
        &self,
        task_id: TaskId,
        annotator_id: UserId,
    ) -> AnnotationRepositoryResult<Option<Annotation>> {
        let state = self.read()?;
        Ok(state
            .annotations
            .values()
            .find(|annotation| {
                annotation.task_id() == task_id && annotation.annotator_id() == annotator_id
            })
            .cloned())
    }

    async fn update_locked(
        &self,
        id: AnnotationId,
        mutation: AnnotationMutation,
    ) -> AnnotationRepositoryResult<Annotation> {
        let mut state = self.write()?;
        let annotation = state
            .annotations
            .get_mut(&id)
            .ok_or(AnnotationRepositoryError::NotFound(id))?;
        let outcome = mutation(annotation);
        let snapshot = annotation.clone();
        outcome?;
        Ok(snapshot)
    }

    async fn list_submitted(
        &self,
        project_id: ProjectId,
        excluded: &[AnnotationId],
    ) -> AnnotationRepositoryResult<Vec<Annotation>> {
        let state = self.read()?;
        let mut submitted: Vec<Annotation> = state
            .annotations
            .values()
            .filter(|annotation| {
                annotation.project_id() == project_id
                    && annotation.status() == AnnotationStatus::Submitted
                    && !excluded.contains(&annotation.id())
            })
            .cloned()
            .collect();
        submitted.sort_by_key(|annotation| (annotation.submitted_at(), annotation.id()));
        Ok(submitted)
    }

    async fn list_under_review(
        &self,
        project_id: ProjectId,
    ) -> AnnotationRepositoryResult<Vec<Annotation>> {
        let state = self.read()?;
        Ok(state
            .annotations
            .values()
            .filter(|annotation| {
                annotation.project_id() == project_id
                    && annotation.status() == AnnotationStatus::UnderReview
            })
            .cloned()
            .collect())
    }

    async fn upsert_value(&self, value: &AnnotationValue) -> AnnotationRepositoryResult<()> {
        let mut state = self.write()?;
        let key = (value.annotation_id(), value.dimension_id());
        // Replacing an existing value keeps its original creation timestamp,
        // matching the SQL upsert.
        if let Some(existing) = state.values.get_mut(&key) {
            existing.set_answer(value.answer().clone(), value.updated_at());
        } else {
            state.values.insert(key, value.clone());
        }
        Ok(())
    }

    async fn delete_values_except(
        &self,
        annotation_id: AnnotationId,
        keep: &[DimensionId],
    ) -> AnnotationRepositoryResult<usize> {
        let mut state = self.write()?;
        let before = state.values.len();
        state.values.retain(|(owner, dimension_id), _| {
            *owner != annotation_id || keep.contains(dimension_id)
        });
        Ok(before - state.values.len())
    }

    async fn list_values(
        &self,
        annotation_id: AnnotationId,
    ) -> AnnotationRepositoryResult<Vec<AnnotationValue>> {
        let state = self.read()?;
        let mut values: Vec<AnnotationValue> = state
            .values
            .values()
            .filter(|value| value.annotation_id() == annotation_id)
            .cloned()
            .collect();
        values.sort_by_key(AnnotationValue::created_at);
        Ok(values)
    }
}
