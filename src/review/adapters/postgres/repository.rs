//! `PostgreSQL` repository implementation for review persistence.

use super::{
    models::{NewReviewChangeRow, NewReviewRow, ReviewChangeRow, ReviewRow},
    schema::{review_changes, reviews},
};
use crate::annotation::domain::{AnnotationId, DimensionAnswer};
use crate::project::domain::{DimensionId, ProjectId, UserId};
use crate::review::{
    domain::{PersistedReviewData, Review, ReviewAction, ReviewChange, ReviewId},
    ports::{ReviewMutation, ReviewRepository, ReviewRepositoryError, ReviewRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by review adapters.
pub type ReviewPgPool = Pool<ConnectionManager<PgConnection>>;

impl From<DieselError> for ReviewRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed review repository.
#[derive(Debug, Clone)]
pub struct PostgresReviewRepository {
    pool: ReviewPgPool,
}

impl PostgresReviewRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ReviewPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ReviewRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ReviewRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ReviewRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ReviewRepositoryError::persistence)?
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn store(&self, review: &Review) -> ReviewRepositoryResult<()> {
        let review_id = review.id();
        let new_row = to_new_row(review);
        self.run_blocking(move |connection| {
            diesel::insert_into(reviews::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ReviewRepositoryError::DuplicateReview(review_id)
                    }
                    _ => ReviewRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: ReviewId) -> ReviewRepositoryResult<Option<Review>> {
        self.run_blocking(move |connection| {
            let row = reviews::table
                .filter(reviews::id.eq(id.into_inner()))
                .select(ReviewRow::as_select())
                .first::<ReviewRow>(connection)
                .optional()
                .map_err(ReviewRepositoryError::persistence)?;
            row.map(row_to_review).transpose()
        })
        .await
    }

    async fn update_locked(
        &self,
        id: ReviewId,
        mutation: ReviewMutation,
    ) -> ReviewRepositoryResult<Review> {
        self.run_blocking(move |connection| {
            let (review, outcome) =
                connection.transaction::<_, ReviewRepositoryError, _>(|connection| {
                    let row = reviews::table
                        .filter(reviews::id.eq(id.into_inner()))
                        .for_update()
                        .select(ReviewRow::as_select())
                        .first::<ReviewRow>(connection)
                        .optional()?
                        .ok_or(ReviewRepositoryError::NotFound(id))?;
                    let mut review = row_to_review(row)?;
                    let outcome = mutation(&mut review);
                    persist_review(connection, &review)?;
                    Ok((review, outcome))
                })?;
            outcome?;
            Ok(review)
        })
        .await
    }

    async fn find_open_for_reviewer(
        &self,
        project_id: ProjectId,
        reviewer_id: UserId,
    ) -> ReviewRepositoryResult<Option<Review>> {
        self.run_blocking(move |connection| {
            let row = reviews::table
                .filter(reviews::project_id.eq(project_id.into_inner()))
                .filter(reviews::reviewer_id.eq(reviewer_id.into_inner()))
                .filter(reviews::completed_at.is_null())
                .select(ReviewRow::as_select())
                .first::<ReviewRow>(connection)
                .optional()
                .map_err(ReviewRepositoryError::persistence)?;
            row.map(row_to_review).transpose()
        })
        .await
    }

    async fn find_open_for_annotation(
        &self,
        annotation_id: AnnotationId,
    ) -> ReviewRepositoryResult<Option<Review>> {
        self.run_blocking(move |connection| {
            let row = reviews::table
                .filter(reviews::annotation_id.eq(annotation_id.into_inner()))
                .filter(reviews::completed_at.is_null())
                .select(ReviewRow::as_select())
                .first::<ReviewRow>(connection)
                .optional()
                .map_err(ReviewRepositoryError::persistence)?;
            row.map(row_to_review).transpose()
        })
        .await
    }

    async fn append_change(&self, change: &ReviewChange) -> ReviewRepositoryResult<()> {
        let new_row = to_new_change_row(change)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(review_changes::table)
                .values(&new_row)
                .execute(connection)
                .map_err(ReviewRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_changes(&self, review_id: ReviewId) -> ReviewRepositoryResult<Vec<ReviewChange>> {
        self.run_blocking(move |connection| {
            let rows = review_changes::table
                .filter(review_changes::review_id.eq(review_id.into_inner()))
                .order(review_changes::created_at.asc())
                .select(ReviewChangeRow::as_select())
                .load::<ReviewChangeRow>(connection)
                .map_err(ReviewRepositoryError::persistence)?;
            rows.into_iter().map(row_to_change).collect()
        })
        .await
    }
}

fn persist_review(connection: &mut PgConnection, review: &Review) -> ReviewRepositoryResult<()> {
    let row = to_new_row(review);
    diesel::update(reviews::table.filter(reviews::id.eq(review.id().into_inner())))
        .set((
            reviews::action.eq(row.action),
            reviews::feedback.eq(row.feedback),
            reviews::completed_at.eq(row.completed_at),
        ))
        .execute(connection)
        .map_err(ReviewRepositoryError::persistence)?;
    Ok(())
}

fn to_new_row(review: &Review) -> NewReviewRow {
    NewReviewRow {
        id: review.id().into_inner(),
        annotation_id: review.annotation_id().into_inner(),
        project_id: review.project_id().into_inner(),
        reviewer_id: review.reviewer_id().into_inner(),
        started_at: review.started_at(),
        expires_at: review.expires_at(),
        action: review.action().map(|action| action.as_str().to_owned()),
        feedback: review.feedback().map(str::to_owned),
        completed_at: review.completed_at(),
    }
}

fn row_to_review(row: ReviewRow) -> ReviewRepositoryResult<Review> {
    let action = row
        .action
        .as_deref()
        .map(ReviewAction::try_from)
        .transpose()
        .map_err(ReviewRepositoryError::persistence)?;
    let data = PersistedReviewData {
        id: ReviewId::from_uuid(row.id),
        annotation_id: AnnotationId::from_uuid(row.annotation_id),
        project_id: ProjectId::from_uuid(row.project_id),
        reviewer_id: UserId::from_uuid(row.reviewer_id),
        started_at: row.started_at,
        expires_at: row.expires_at,
        action,
        feedback: row.feedback,
        completed_at: row.completed_at,
    };
    Ok(Review::from_persisted(data))
}

fn to_new_change_row(change: &ReviewChange) -> ReviewRepositoryResult<NewReviewChangeRow> {
    let original =
        serde_json::to_value(&change.original).map_err(ReviewRepositoryError::persistence)?;
    let corrected =
        serde_json::to_value(&change.corrected).map_err(ReviewRepositoryError::persistence)?;
    Ok(NewReviewChangeRow {
        id: uuid::Uuid::new_v4(),
        review_id: change.review_id.into_inner(),
        dimension_id: change.dimension_id.into_inner(),
        original,
        corrected,
        reason: change.reason.clone(),
        created_at: change.created_at,
    })
}

fn row_to_change(row: ReviewChangeRow) -> ReviewRepositoryResult<ReviewChange> {
    let original = serde_json::from_value::<DimensionAnswer>(row.original)
        .map_err(ReviewRepositoryError::persistence)?;
    let corrected = serde_json::from_value::<DimensionAnswer>(row.corrected)
        .map_err(ReviewRepositoryError::persistence)?;
    Ok(ReviewChange {
        review_id: ReviewId::from_uuid(row.review_id),
        dimension_id: DimensionId::from_uuid(row.dimension_id),
        original,
        corrected,
        reason: row.reason,
        created_at: row.created_at,
    })
}
