//! `PostgreSQL` repository implementation for task persistence.

use super::{
    models::{NewTaskRow, TaskRow},
    schema::tasks,
};
use crate::batch::domain::{BatchCounters, BatchId};
use crate::project::domain::{ProjectId, UserId};
use crate::task::{
    domain::{AudioFileRef, PersistedTaskData, Task, TaskId, TaskStatus},
    ports::{TaskMutation, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Active claim statuses as stored.
const ACTIVE_CLAIM_STATUSES: [&str; 2] = ["assigned", "in_progress"];

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed task repository.
///
/// Guarded mutations run inside one transaction with the task row held
/// under `SELECT ... FOR UPDATE`, so concurrent claimants serialize on the
/// row and exactly one of them sees the `pending` status.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let new_row = to_new_row(task);
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn update_locked(
        &self,
        id: TaskId,
        mutation: TaskMutation,
    ) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            // The mutation's outcome travels out of the transaction so that
            // a domain rejection still commits the mutated row (an expired
            // claim resets to pending before the error surfaces).
            let (task, outcome) =
                connection.transaction::<_, TaskRepositoryError, _>(|connection| {
                    let row = tasks::table
                        .filter(tasks::id.eq(id.into_inner()))
                        .for_update()
                        .select(TaskRow::as_select())
                        .first::<TaskRow>(connection)
                        .optional()?
                        .ok_or(TaskRepositoryError::NotFound(id))?;
                    let mut task = row_to_task(row)?;
                    let outcome = mutation(&mut task);
                    persist_task(connection, &task)?;
                    Ok((task, outcome))
                })?;
            outcome?;
            Ok(task)
        })
        .await
    }

    async fn find_active_claim(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .filter(tasks::assigned_to.eq(user_id.into_inner()))
                .filter(tasks::status.eq_any(ACTIVE_CLAIM_STATUSES))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_oldest_claimable(
        &self,
        project_id: ProjectId,
        batch_ids: &[BatchId],
        excluded: &[TaskId],
    ) -> TaskRepositoryResult<Option<Task>> {
        let batch_uuids: Vec<uuid::Uuid> = batch_ids.iter().map(|id| id.into_inner()).collect();
        let excluded_uuids: Vec<uuid::Uuid> = excluded.iter().map(|id| id.into_inner()).collect();
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .filter(tasks::status.eq(TaskStatus::Pending.as_str()))
                .filter(tasks::batch_id.eq_any(batch_uuids.iter().copied().map(Some)))
                .filter(diesel::dsl::not(tasks::id.eq_any(excluded_uuids)))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_expired_claims(
        &self,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .filter(tasks::status.eq_any(ACTIVE_CLAIM_STATUSES))
                .filter(tasks::expires_at.lt(now))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn counters_for_batch(&self, batch_id: BatchId) -> TaskRepositoryResult<BatchCounters> {
        self.run_blocking(move |connection| {
            let statuses: Vec<String> = tasks::table
                .filter(tasks::batch_id.eq(batch_id.into_inner()))
                .select(tasks::status)
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let mut counters = BatchCounters::default();
            for status in &statuses {
                let status = TaskStatus::try_from(status.as_str())
                    .map_err(TaskRepositoryError::persistence)?;
                counters.total_tasks += 1;
                if status.is_completed() {
                    counters.completed_tasks += 1;
                }
                match status {
                    TaskStatus::Approved => counters.approved_tasks += 1,
                    TaskStatus::Rejected => counters.rejected_tasks += 1,
                    _ => {}
                }
            }
            Ok(counters)
        })
        .await
    }

    async fn publish_batch_tasks(
        &self,
        batch_id: BatchId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<usize> {
        self.run_blocking(move |connection| {
            diesel::update(
                tasks::table
                    .filter(tasks::batch_id.eq(batch_id.into_inner()))
                    .filter(tasks::status.eq(TaskStatus::Draft.as_str())),
            )
            .set((
                tasks::status.eq(TaskStatus::Pending.as_str()),
                tasks::updated_at.eq(now),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn delete_by_batch(&self, batch_id: BatchId) -> TaskRepositoryResult<usize> {
        self.run_blocking(move |connection| {
            diesel::delete(tasks::table.filter(tasks::batch_id.eq(batch_id.into_inner())))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)
        })
        .await
    }
}

fn persist_task(connection: &mut PgConnection, task: &Task) -> TaskRepositoryResult<()> {
    let row = to_new_row(task);
    diesel::update(tasks::table.filter(tasks::id.eq(task.id().into_inner())))
        .set((
            tasks::status.eq(row.status),
            tasks::assigned_to.eq(row.assigned_to),
            tasks::assigned_at.eq(row.assigned_at),
            tasks::expires_at.eq(row.expires_at),
            tasks::completed_at.eq(row.completed_at),
            tasks::updated_at.eq(row.updated_at),
        ))
        .execute(connection)
        .map_err(TaskRepositoryError::persistence)?;
    Ok(())
}

fn to_new_row(task: &Task) -> NewTaskRow {
    NewTaskRow {
        id: task.id().into_inner(),
        project_id: task.project_id().into_inner(),
        batch_id: task.batch_id().map(BatchId::into_inner),
        audio_file: task.audio_file().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        assigned_to: task.assigned_to().map(UserId::into_inner),
        assigned_at: task.assigned_at(),
        expires_at: task.expires_at(),
        completed_at: task.completed_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let audio_file = AudioFileRef::new(row.audio_file)?;
    let data = PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        batch_id: row.batch_id.map(BatchId::from_uuid),
        audio_file,
        status,
        assigned_to: row.assigned_to.map(UserId::from_uuid),
        assigned_at: row.assigned_at,
        expires_at: row.expires_at,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Task::from_persisted(data))
}
