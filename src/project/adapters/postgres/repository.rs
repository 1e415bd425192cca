//! `PostgreSQL` repository implementation for the project context.

use super::{
    models::{DimensionRow, MemberRow, NewDimensionRow, NewMemberRow, NewProjectRow, ProjectRow},
    schema::{annotation_dimensions, project_members, projects},
};
use crate::project::{
    domain::{
        AnnotationDimension, DimensionId, DimensionSchema, MemberRole, PersistedDimensionData,
        PersistedProjectData, Project, ProjectId, ProjectMember, ProjectName, ProjectStatus,
        TimeBoxMinutes, UserId,
    },
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by project adapters.
pub type ProjectPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed project repository.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: ProjectPgPool,
}

impl PostgresProjectRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ProjectPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ProjectRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ProjectRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ProjectRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ProjectRepositoryError::persistence)?
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let project_id = project.id();
        let new_row = to_new_project_row(project)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(projects::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ProjectRepositoryError::DuplicateProject(project_id)
                    }
                    _ => ProjectRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let project_id = project.id();
        let status = project.status().as_str().to_owned();
        let updated_at = project.updated_at();
        self.run_blocking(move |connection| {
            let affected = diesel::update(
                projects::table.filter(projects::id.eq(project_id.into_inner())),
            )
            .set((
                projects::status.eq(status),
                projects::updated_at.eq(updated_at),
            ))
            .execute(connection)
            .map_err(ProjectRepositoryError::persistence)?;
            if affected == 0 {
                return Err(ProjectRepositoryError::NotFound(project_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        self.run_blocking(move |connection| {
            let row = projects::table
                .filter(projects::id.eq(id.into_inner()))
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()
                .map_err(ProjectRepositoryError::persistence)?;
            row.map(row_to_project).transpose()
        })
        .await
    }

    async fn store_dimension(
        &self,
        dimension: &AnnotationDimension,
    ) -> ProjectRepositoryResult<()> {
        let dimension_id = dimension.id();
        let new_row = to_new_dimension_row(dimension)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(annotation_dimensions::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ProjectRepositoryError::DuplicateDimension(dimension_id)
                    }
                    _ => ProjectRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn list_dimensions(
        &self,
        project_id: ProjectId,
    ) -> ProjectRepositoryResult<Vec<AnnotationDimension>> {
        self.run_blocking(move |connection| {
            let rows = annotation_dimensions::table
                .filter(annotation_dimensions::project_id.eq(project_id.into_inner()))
                .order(annotation_dimensions::created_at.asc())
                .select(DimensionRow::as_select())
                .load::<DimensionRow>(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            rows.into_iter().map(row_to_dimension).collect()
        })
        .await
    }

    async fn upsert_member(&self, member: &ProjectMember) -> ProjectRepositoryResult<()> {
        let new_row = to_new_member_row(member);
        self.run_blocking(move |connection| {
            diesel::insert_into(project_members::table)
                .values(&new_row)
                .on_conflict((project_members::project_id, project_members::user_id))
                .do_update()
                .set((
                    project_members::role.eq(new_row.role.clone()),
                    project_members::active.eq(new_row.active),
                ))
                .execute(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ProjectRepositoryResult<Option<ProjectMember>> {
        self.run_blocking(move |connection| {
            let row = project_members::table
                .filter(project_members::project_id.eq(project_id.into_inner()))
                .filter(project_members::user_id.eq(user_id.into_inner()))
                .select(MemberRow::as_select())
                .first::<MemberRow>(connection)
                .optional()
                .map_err(ProjectRepositoryError::persistence)?;
            row.map(row_to_member).transpose()
        })
        .await
    }
}

fn to_new_project_row(project: &Project) -> ProjectRepositoryResult<NewProjectRow> {
    Ok(NewProjectRow {
        id: project.id().into_inner(),
        name: project.name().as_str().to_owned(),
        status: project.status().as_str().to_owned(),
        task_time_minutes: minutes_to_column(project.task_time())?,
        review_time_minutes: minutes_to_column(project.review_time())?,
        created_at: project.created_at(),
        updated_at: project.updated_at(),
    })
}

fn minutes_to_column(minutes: TimeBoxMinutes) -> ProjectRepositoryResult<i32> {
    i32::try_from(minutes.value()).map_err(ProjectRepositoryError::persistence)
}

fn minutes_from_column(minutes: i32) -> ProjectRepositoryResult<TimeBoxMinutes> {
    let value = u32::try_from(minutes).map_err(ProjectRepositoryError::persistence)?;
    TimeBoxMinutes::new(value).map_err(ProjectRepositoryError::persistence)
}

fn row_to_project(row: ProjectRow) -> ProjectRepositoryResult<Project> {
    let name = ProjectName::new(row.name).map_err(ProjectRepositoryError::persistence)?;
    let status =
        ProjectStatus::try_from(row.status.as_str()).map_err(ProjectRepositoryError::persistence)?;
    let data = PersistedProjectData {
        id: ProjectId::from_uuid(row.id),
        name,
        status,
        task_time: minutes_from_column(row.task_time_minutes)?,
        review_time: minutes_from_column(row.review_time_minutes)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Project::from_persisted(data))
}

fn to_new_dimension_row(dimension: &AnnotationDimension) -> ProjectRepositoryResult<NewDimensionRow> {
    let schema =
        serde_json::to_value(dimension.schema()).map_err(ProjectRepositoryError::persistence)?;
    Ok(NewDimensionRow {
        id: dimension.id().into_inner(),
        project_id: dimension.project_id().into_inner(),
        name: dimension.name().to_owned(),
        schema,
        created_at: dimension.created_at(),
    })
}

fn row_to_dimension(row: DimensionRow) -> ProjectRepositoryResult<AnnotationDimension> {
    let schema = serde_json::from_value::<DimensionSchema>(row.schema)
        .map_err(ProjectRepositoryError::persistence)?;
    let data = PersistedDimensionData {
        id: DimensionId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        name: row.name,
        schema,
        created_at: row.created_at,
    };
    Ok(AnnotationDimension::from_persisted(data))
}

fn to_new_member_row(member: &ProjectMember) -> NewMemberRow {
    NewMemberRow {
        project_id: member.project_id.into_inner(),
        user_id: member.user_id.into_inner(),
        role: member.role.as_str().to_owned(),
        active: member.active,
        created_at: member.created_at,
    }
}

fn row_to_member(row: MemberRow) -> ProjectRepositoryResult<ProjectMember> {
    let role =
        MemberRole::try_from(row.role.as_str()).map_err(ProjectRepositoryError::persistence)?;
    Ok(ProjectMember {
        project_id: ProjectId::from_uuid(row.project_id),
        user_id: UserId::from_uuid(row.user_id),
        role,
        active: row.active,
        created_at: row.created_at,
    })
}
