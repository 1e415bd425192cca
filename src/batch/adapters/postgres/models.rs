//! Diesel row models for batch persistence.

use super::schema::batches;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for batch records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = batches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BatchRow {
    /// Batch identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Batch name.
    pub name: String,
    /// Lifecycle status.
    pub status: String,
    /// Total member tasks.
    pub total_tasks: i32,
    /// Member tasks in a completed status.
    pub completed_tasks: i32,
    /// Member tasks approved by review.
    pub approved_tasks: i32,
    /// Member tasks rejected by review.
    pub rejected_tasks: i32,
    /// Derived completion percentage.
    pub completion_percentage: f32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert model for batch records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = batches)]
pub struct NewBatchRow {
    /// Batch identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Batch name.
    pub name: String,
    /// Lifecycle status.
    pub status: String,
    /// Total member tasks.
    pub total_tasks: i32,
    /// Member tasks in a completed status.
    pub completed_tasks: i32,
    /// Member tasks approved by review.
    pub approved_tasks: i32,
    /// Member tasks rejected by review.
    pub rejected_tasks: i32,
    /// Derived completion percentage.
    pub completion_percentage: f32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
}
