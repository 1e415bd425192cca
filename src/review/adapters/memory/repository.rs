//! In-memory review repository for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::annotation::domain::AnnotationId;
use crate::project::domain::{ProjectId, UserId};
use crate::review::{
    domain::{Review, ReviewChange, ReviewId},
    ports::{ReviewMutation, ReviewRepository, ReviewRepositoryError, ReviewRepositoryResult},
};

#[derive(Debug, Default)]
struct State {
    reviews: HashMap<ReviewId, Review>,
    changes: Vec<ReviewChange>,
}

/// Thread-safe in-memory review repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReviewRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryReviewRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ReviewRepositoryResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|err| {
            ReviewRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> ReviewRepositoryResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|err| {
            ReviewRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn store(&self, review: &Review) -> ReviewRepositoryResult<()> {
        let mut state = self.write()?;
        if state.reviews.contains_key(&review.id()) {
            return Err(ReviewRepositoryError::DuplicateReview(review.id()));
        }
        state.reviews.insert(review.id(), review.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ReviewId) -> ReviewRepositoryResult<Option<Review>> {
        let state = self.read()?;
        Ok(state.reviews.get(&id).cloned())
    }

    async fn update_locked(
        &self,
        id: ReviewId,
        mutation: ReviewMutation,
    ) -> ReviewRepositoryResult<Review> {
        let mut state = self.write()?;
        let review = state
            .reviews
            .get_mut(&id)
            .ok_or(ReviewRepositoryError::NotFound(id))?;
        let outcome = mutation(review);
        let snapshot = review.clone();
        outcome?;
        Ok(snapshot)
    }

    async fn find_open_for_reviewer(
        &self,
        project_id: ProjectId,
        reviewer_id: UserId,
    ) -> ReviewRepositoryResult<Option<Review>> {
        let state = self.read()?;
        Ok(state
            .reviews
            .values()
            .find(|review| {
                review.project_id() == project_id
                    && review.reviewer_id() == reviewer_id
                    && review.is_open()
            })
            .cloned())
    }

    async fn find_open_for_annotation(
        &self,
        annotation_id: AnnotationId,
    ) -> ReviewRepositoryResult<Option<Review>> {
        let state = self.read()?;
        Ok(state
            .reviews
            .values()
            .find(|review| review.annotation_id() == annotation_id && review.is_open())
            .cloned())
    }

    async fn append_change(&self, change: &ReviewChange) -> ReviewRepositoryResult<()> {
        let mut state = self.write()?;
        state.changes.push(change.clone());
        Ok(())
    }

    async fn list_changes(&self, review_id: ReviewId) -> ReviewRepositoryResult<Vec<ReviewChange>> {
        let state = self.read()?;
        Ok(state
            .changes
            .iter()
            .filter(|change| change.review_id == review_id)
            .cloned()
            .collect())
    }
}
