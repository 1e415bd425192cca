//! Diesel row models for project persistence.

use super::schema::{annotation_dimensions, project_members, projects};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for project records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: uuid::Uuid,
    /// Project name.
    pub name: String,
    /// Lifecycle status.
    pub status: String,
    /// Minutes granted per task claim.
    pub task_time_minutes: i32,
    /// Minutes granted per review.
    pub review_time_minutes: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for project records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProjectRow {
    /// Project identifier.
    pub id: uuid::Uuid,
    /// Project name.
    pub name: String,
    /// Lifecycle status.
    pub status: String,
    /// Minutes granted per task claim.
    pub task_time_minutes: i32,
    /// Minutes granted per review.
    pub review_time_minutes: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for dimension records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = annotation_dimensions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DimensionRow {
    /// Dimension identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Dimension name.
    pub name: String,
    /// Per-kind configuration payload.
    pub schema: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for dimension records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = annotation_dimensions)]
pub struct NewDimensionRow {
    /// Dimension identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Dimension name.
    pub name: String,
    /// Per-kind configuration payload.
    pub schema: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for membership records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = project_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MemberRow {
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Member user.
    pub user_id: uuid::Uuid,
    /// Granted role.
    pub role: String,
    /// Whether the membership is active.
    pub active: bool,
    /// Timestamp the membership was granted.
    pub created_at: DateTime<Utc>,
}

/// Insert/upsert model for membership records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_members)]
pub struct NewMemberRow {
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Member user.
    pub user_id: uuid::Uuid,
    /// Granted role.
    pub role: String,
    /// Whether the membership is active.
    pub active: bool,
    /// Timestamp the membership was granted.
    pub created_at: DateTime<Utc>,
}
