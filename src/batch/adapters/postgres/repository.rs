//! `PostgreSQL` repository implementation for batch persistence.

use super::{
    models::{BatchRow, NewBatchRow},
    schema::batches,
};
use crate::batch::{
    domain::{Batch, BatchCounters, BatchId, BatchStatus, PersistedBatchData},
    ports::{BatchRepository, BatchRepositoryError, BatchRepositoryResult},
};
use crate::project::domain::ProjectId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by batch adapters.
pub type BatchPgPool = Pool<ConnectionManager<PgConnection>>;

/// Claimable batch statuses as stored.
const CLAIMABLE_STATUSES: [&str; 2] = ["published", "in_progress"];

/// `PostgreSQL`-backed batch repository.
#[derive(Debug, Clone)]
pub struct PostgresBatchRepository {
    pool: BatchPgPool,
}

impl PostgresBatchRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BatchPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> BatchRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BatchRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BatchRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(BatchRepositoryError::persistence)?
    }
}

#[async_trait]
impl BatchRepository for PostgresBatchRepository {
    async fn store(&self, batch: &Batch) -> BatchRepositoryResult<()> {
        let batch_id = batch.id();
        let new_row = to_new_row(batch)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(batches::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BatchRepositoryError::DuplicateBatch(batch_id)
                    }
                    _ => BatchRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, batch: &Batch) -> BatchRepositoryResult<()> {
        let batch_id = batch.id();
        let row = to_new_row(batch)?;
        self.run_blocking(move |connection| {
            let affected =
                diesel::update(batches::table.filter(batches::id.eq(batch_id.into_inner())))
                    .set((
                        batches::status.eq(row.status),
                        batches::total_tasks.eq(row.total_tasks),
                        batches::completed_tasks.eq(row.completed_tasks),
                        batches::approved_tasks.eq(row.approved_tasks),
                        batches::rejected_tasks.eq(row.rejected_tasks),
                        batches::completion_percentage.eq(row.completion_percentage),
                        batches::updated_at.eq(row.updated_at),
                        batches::completed_at.eq(row.completed_at),
                    ))
                    .execute(connection)
                    .map_err(BatchRepositoryError::persistence)?;
            if affected == 0 {
                return Err(BatchRepositoryError::NotFound(batch_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: BatchId) -> BatchRepositoryResult<Option<Batch>> {
        self.run_blocking(move |connection| {
            let row = batches::table
                .filter(batches::id.eq(id.into_inner()))
                .select(BatchRow::as_select())
                .first::<BatchRow>(connection)
                .optional()
                .map_err(BatchRepositoryError::persistence)?;
            row.map(row_to_batch).transpose()
        })
        .await
    }

    async fn list_claimable(&self, project_id: ProjectId) -> BatchRepositoryResult<Vec<Batch>> {
        self.run_blocking(move |connection| {
            let rows = batches::table
                .filter(batches::project_id.eq(project_id.into_inner()))
                .filter(batches::status.eq_any(CLAIMABLE_STATUSES))
                .order(batches::created_at.asc())
                .select(BatchRow::as_select())
                .load::<BatchRow>(connection)
                .map_err(BatchRepositoryError::persistence)?;
            rows.into_iter().map(row_to_batch).collect()
        })
        .await
    }

    async fn delete(&self, id: BatchId) -> BatchRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let affected = diesel::delete(batches::table.filter(batches::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(BatchRepositoryError::persistence)?;
            if affected == 0 {
                return Err(BatchRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn count_to_column(count: u32) -> BatchRepositoryResult<i32> {
    i32::try_from(count).map_err(BatchRepositoryError::persistence)
}

fn count_from_column(count: i32) -> BatchRepositoryResult<u32> {
    u32::try_from(count).map_err(BatchRepositoryError::persistence)
}

fn to_new_row(batch: &Batch) -> BatchRepositoryResult<NewBatchRow> {
    let counters = batch.counters();
    Ok(NewBatchRow {
        id: batch.id().into_inner(),
        project_id: batch.project_id().into_inner(),
        name: batch.name().to_owned(),
        status: batch.status().as_str().to_owned(),
        total_tasks: count_to_column(counters.total_tasks)?,
        completed_tasks: count_to_column(counters.completed_tasks)?,
        approved_tasks: count_to_column(counters.approved_tasks)?,
        rejected_tasks: count_to_column(counters.rejected_tasks)?,
        completion_percentage: batch.completion_percentage(),
        created_at: batch.created_at(),
        updated_at: batch.updated_at(),
        completed_at: batch.completed_at(),
    })
}

fn row_to_batch(row: BatchRow) -> BatchRepositoryResult<Batch> {
    let status =
        BatchStatus::try_from(row.status.as_str()).map_err(BatchRepositoryError::persistence)?;
    let counters = BatchCounters {
        total_tasks: count_from_column(row.total_tasks)?,
        completed_tasks: count_from_column(row.completed_tasks)?,
        approved_tasks: count_from_column(row.approved_tasks)?,
        rejected_tasks: count_from_column(row.rejected_tasks)?,
    };
    let data = PersistedBatchData {
        id: BatchId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        name: row.name,
        status,
        counters,
        completion_percentage: row.completion_percentage,
        created_at: row.created_at,
        updated_at: row.updated_at,
        completed_at: row.completed_at,
    };
    Ok(Batch::from_persisted(data))
}
