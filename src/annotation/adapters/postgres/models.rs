//! Diesel row models for annotation persistence.

use super::schema::{annotation_values, annotations};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for annotation records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = annotations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AnnotationRow {
    /// Annotation identifier.
    pub id: uuid::Uuid,
    /// Annotated task.
    pub task_id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Authoring annotator.
    pub annotator_id: uuid::Uuid,
    /// Lifecycle status.
    pub status: String,
    /// Submission timestamp, if submitted.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for annotation records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = annotations)]
pub struct NewAnnotationRow {
    /// Annotation identifier.
    pub id: uuid::Uuid,
    /// Annotated task.
    pub task_id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Authoring annotator.
    pub annotator_id: uuid::Uuid,
    /// Lifecycle status.
    pub status: String,
    /// Submission timestamp, if submitted.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for annotation values.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = annotation_values)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AnnotationValueRow {
    /// Owning annotation.
    pub annotation_id: uuid::Uuid,
    /// Answered dimension.
    pub dimension_id: uuid::Uuid,
    /// Answer payload.
    pub answer: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for annotation values.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = annotation_values)]
pub struct NewAnnotationValueRow {
    /// Owning annotation.
    pub annotation_id: uuid::Uuid,
    /// Answered dimension.
    pub dimension_id: uuid::Uuid,
    /// Answer payload.
    pub answer: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
