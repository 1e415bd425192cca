//! `PostgreSQL` repository implementation for annotation persistence.

use super::{
    models::{AnnotationRow, AnnotationValueRow, NewAnnotationRow, NewAnnotationValueRow},
    schema::{annotation_values, annotations},
};
use crate::annotation::{
    domain::{
        Annotation, AnnotationId, AnnotationStatus, AnnotationValue, DimensionAnswer,
        PersistedAnnotationData,
    },
    ports::{
        AnnotationMutation, AnnotationRepository, AnnotationRepositoryError,
        AnnotationRepositoryResult,
    },
};
use crate::project::domain::{DimensionId, ProjectId, UserId};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by annotation adapters.
pub type AnnotationPgPool = Pool<ConnectionManager<PgConnection>>;

impl From<DieselError> for AnnotationRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed annotation repository.
#[derive(Debug, Clone)]
pub struct PostgresAnnotationRepository {
    pool: AnnotationPgPool,
}

impl PostgresAnnotationRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AnnotationPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> AnnotationRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AnnotationRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(AnnotationRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(AnnotationRepositoryError::persistence)?
    }
}

#[async_trait]
impl AnnotationRepository for PostgresAnnotationRepository {
    async fn store(&self, annotation: &Annotation) -> AnnotationRepositoryResult<()> {
        let annotation_id = annotation.id();
        let new_row = to_new_row(annotation);
        self.run_blocking(move |connection| {
            diesel::insert_into(annotations::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AnnotationRepositoryError::DuplicateAnnotation(annotation_id)
                    }
                    _ => AnnotationRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: AnnotationId,
    ) -> AnnotationRepositoryResult<Option<Annotation>> {
        self.run_blocking(move |connection| {
            let row = annotations::table
                .filter(annotations::id.eq(id.into_inner()))
                .select(AnnotationRow::as_select())
                .first::<AnnotationRow>(connection)
                .optional()
                .map_err(AnnotationRepositoryError::persistence)?;
            row.map(row_to_annotation).transpose()
        })
        .await
    }

    async fn find_by_task(
        &self,
        task_id: TaskId,
    ) -> AnnotationRepositoryResult<Option<Annotation>> {
        self.run_blocking(move |connection| {
            let row = annotations::table
                .filter(annotations::task_id.eq(task_id.into_inner()))
                .order((annotations::created_at.desc(), annotations::id.desc()))
                .select(AnnotationRow::as_select())
                .first::<AnnotationRow>(connection)
                .optional()
                .map_err(AnnotationRepositoryError::persistence)?;
            row.map(row_to_annotation).transpose()
        })
        .await
    }

    async fn find_by_task_and_annotator(
        &self,
        task_id: TaskId,
        annotator_id: UserId,
    ) -> AnnotationRepositoryResult<Option<Annotation>> {
        self.run_blocking(move |connection| {
            let row = annotations::table
                .filter(annotations::task_id.eq(task_id.into_inner()))
                .filter(annotations::annotator_id.eq(annotator_id.into_inner()))
                .select(AnnotationRow::as_select())
                .first::<AnnotationRow>(connection)
                .optional()
                .map_err(AnnotationRepositoryError::persistence)?;
            row.map(row_to_annotation).transpose()
        })
        .await
    }

    async fn update_locked(
        &self,
        id: AnnotationId,
        mutation: AnnotationMutation,
    ) -> AnnotationRepositoryResult<Annotation> {
        self.run_blocking(move |connection| {
            let (annotation, outcome) =
                connection.transaction::<_, AnnotationRepositoryError, _>(|connection| {
                    let row = annotations::table
                        .filter(annotations::id.eq(id.into_inner()))
                        .for_update()
                        .select(AnnotationRow::as_select())
                        .first::<AnnotationRow>(connection)
                        .optional()?
                        .ok_or(AnnotationRepositoryError::NotFound(id))?;
                    let mut annotation = row_to_annotation(row)?;
                    let outcome = mutation(&mut annotation);
                    persist_annotation(connection, &annotation)?;
                    Ok((annotation, outcome))
                })?;
            outcome?;
            Ok(annotation)
        })
        .await
    }

    async fn list_submitted(
        &self,
        project_id: ProjectId,
        excluded: &[AnnotationId],
    ) -> AnnotationRepositoryResult<Vec<Annotation>> {
        let excluded_uuids: Vec<uuid::Uuid> = excluded.iter().map(|id| id.into_inner()).collect();
        self.run_blocking(move |connection| {
            let rows = annotations::table
                .filter(annotations::project_id.eq(project_id.into_inner()))
                .filter(annotations::status.eq(AnnotationStatus::Submitted.as_str()))
                .filter(diesel::dsl::not(annotations::id.eq_any(excluded_uuids)))
                .order((annotations::submitted_at.asc(), annotations::id.asc()))
                .select(AnnotationRow::as_select())
                .load::<AnnotationRow>(connection)
                .map_err(AnnotationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_annotation).collect()
        })
        .await
    }

    async fn list_under_review(
        &self,
        project_id: ProjectId,
    ) -> AnnotationRepositoryResult<Vec<Annotation>> {
        self.run_blocking(move |connection| {
            let rows = annotations::table
                .filter(annotations::project_id.eq(project_id.into_inner()))
                .filter(annotations::status.eq(AnnotationStatus::UnderReview.as_str()))
                .select(AnnotationRow::as_select())
                .load::<AnnotationRow>(connection)
                .map_err(AnnotationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_annotation).collect()
        })
        .await
    }

    async fn upsert_value(&self, value: &AnnotationValue) -> AnnotationRepositoryResult<()> {
        let new_row = to_new_value_row(value)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(annotation_values::table)
                .values(&new_row)
                .on_conflict((
                    annotation_values::annotation_id,
                    annotation_values::dimension_id,
                ))
                .do_update()
                .set((
                    annotation_values::answer.eq(&new_row.answer),
                    annotation_values::updated_at.eq(new_row.updated_at),
                ))
                .execute(connection)
                .map_err(AnnotationRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn delete_values_except(
        &self,
        annotation_id: AnnotationId,
        keep: &[DimensionId],
    ) -> AnnotationRepositoryResult<usize> {
        let keep_uuids: Vec<uuid::Uuid> = keep.iter().map(|id| id.into_inner()).collect();
        self.run_blocking(move |connection| {
            diesel::delete(
                annotation_values::table
                    .filter(annotation_values::annotation_id.eq(annotation_id.into_inner()))
                    .filter(diesel::dsl::not(
                        annotation_values::dimension_id.eq_any(keep_uuids),
                    )),
            )
            .execute(connection)
            .map_err(AnnotationRepositoryError::persistence)
        })
        .await
    }

    async fn list_values(
        &self,
        annotation_id: AnnotationId,
    ) -> AnnotationRepositoryResult<Vec<AnnotationValue>> {
        self.run_blocking(move |connection| {
            let rows = annotation_values::table
                .filter(annotation_values::annotation_id.eq(annotation_id.into_inner()))
                .order(annotation_values::created_at.asc())
                .select(AnnotationValueRow::as_select())
                .load::<AnnotationValueRow>(connection)
                .map_err(AnnotationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_value).collect()
        })
        .await
    }
}

fn persist_annotation(
    connection: &mut PgConnection,
    annotation: &Annotation,
) -> AnnotationRepositoryResult<()> {
    let row = to_new_row(annotation);
    diesel::update(annotations::table.filter(annotations::id.eq(annotation.id().into_inner())))
        .set((
            annotations::status.eq(row.status),
            annotations::submitted_at.eq(row.submitted_at),
            annotations::updated_at.eq(row.updated_at),
        ))
        .execute(connection)
        .map_err(AnnotationRepositoryError::persistence)?;
    Ok(())
}

fn to_new_row(annotation: &Annotation) -> NewAnnotationRow {
    NewAnnotationRow {
        id: annotation.id().into_inner(),
        task_id: annotation.task_id().into_inner(),
        project_id: annotation.project_id().into_inner(),
        annotator_id: annotation.annotator_id().into_inner(),
        status: annotation.status().as_str().to_owned(),
        submitted_at: annotation.submitted_at(),
        created_at: annotation.created_at(),
        updated_at: annotation.updated_at(),
    }
}

fn row_to_annotation(row: AnnotationRow) -> AnnotationRepositoryResult<Annotation> {
    let status = AnnotationStatus::try_from(row.status.as_str())
        .map_err(AnnotationRepositoryError::persistence)?;
    let data = PersistedAnnotationData {
        id: AnnotationId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        project_id: ProjectId::from_uuid(row.project_id),
        annotator_id: UserId::from_uuid(row.annotator_id),
        status,
        submitted_at: row.submitted_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Annotation::from_persisted(data))
}

fn to_new_value_row(value: &AnnotationValue) -> AnnotationRepositoryResult<NewAnnotationValueRow> {
    let answer =
        serde_json::to_value(value.answer()).map_err(AnnotationRepositoryError::persistence)?;
    Ok(NewAnnotationValueRow {
        annotation_id: value.annotation_id().into_inner(),
        dimension_id: value.dimension_id().into_inner(),
        answer,
        created_at: value.created_at(),
        updated_at: value.updated_at(),
    })
}

fn row_to_value(row: AnnotationValueRow) -> AnnotationRepositoryResult<AnnotationValue> {
    let answer = serde_json::from_value::<DimensionAnswer>(row.answer)
        .map_err(AnnotationRepositoryError::persistence)?;
    Ok(AnnotationValue::from_persisted(
        AnnotationId::from_uuid(row.annotation_id),
        DimensionId::from_uuid(row.dimension_id),
        answer,
        row.created_at,
        row.updated_at,
    ))
}
