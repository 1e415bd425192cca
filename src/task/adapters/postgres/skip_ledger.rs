//! `PostgreSQL` skip ledger implementation.

use super::{models::NewSkipActivityRow, schema::skip_activities};
use crate::annotation::domain::AnnotationId;
use crate::project::domain::{ProjectId, UserId};
use crate::task::{
    domain::{SkipActivity, TaskId},
    ports::{SkipLedger, SkipLedgerError, SkipLedgerResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by the skip ledger.
pub type SkipLedgerPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed skip ledger.
#[derive(Debug, Clone)]
pub struct PostgresSkipLedger {
    pool: SkipLedgerPgPool,
}

impl PostgresSkipLedger {
    /// Creates a new ledger from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SkipLedgerPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SkipLedgerResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SkipLedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(SkipLedgerError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(SkipLedgerError::persistence)?
    }

    async fn skipped_targets(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        activity_type: &'static str,
    ) -> SkipLedgerResult<Vec<uuid::Uuid>> {
        self.run_blocking(move |connection| {
            skip_activities::table
                .filter(skip_activities::project_id.eq(project_id.into_inner()))
                .filter(skip_activities::user_id.eq(user_id.into_inner()))
                .filter(skip_activities::activity_type.eq(activity_type))
                .select(skip_activities::target_id)
                .load(connection)
                .map_err(SkipLedgerError::persistence)
        })
        .await
    }
}

#[async_trait]
impl SkipLedger for PostgresSkipLedger {
    async fn append(&self, activity: &SkipActivity) -> SkipLedgerResult<()> {
        let new_row = NewSkipActivityRow {
            id: activity.id().into_inner(),
            project_id: activity.project_id().into_inner(),
            user_id: activity.user_id().into_inner(),
            activity_type: activity.target().kind().to_owned(),
            target_id: activity.target().target_id(),
            reason: activity.reason().as_str().to_owned(),
            description: activity.description().map(str::to_owned),
            created_at: activity.created_at(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(skip_activities::table)
                .values(&new_row)
                .execute(connection)
                .map_err(SkipLedgerError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn skipped_tasks(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> SkipLedgerResult<Vec<TaskId>> {
        let ids = self.skipped_targets(project_id, user_id, "task").await?;
        Ok(ids.into_iter().map(TaskId::from_uuid).collect())
    }

    async fn skipped_annotations(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> SkipLedgerResult<Vec<AnnotationId>> {
        let ids = self.skipped_targets(project_id, user_id, "review").await?;
        Ok(ids.into_iter().map(AnnotationId::from_uuid).collect())
    }
}
