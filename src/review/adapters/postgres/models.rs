//! Diesel row models for review persistence.

use super::schema::{review_changes, reviews};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for review records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewRow {
    /// Review identifier.
    pub id: uuid::Uuid,
    /// Reviewed annotation.
    pub annotation_id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Owning reviewer.
    pub reviewer_id: uuid::Uuid,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Time-box expiry.
    pub expires_at: DateTime<Utc>,
    /// Outcome, if finalized.
    pub action: Option<String>,
    /// Reviewer feedback, if any.
    pub feedback: Option<String>,
    /// Close timestamp, if closed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert model for review records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReviewRow {
    /// Review identifier.
    pub id: uuid::Uuid,
    /// Reviewed annotation.
    pub annotation_id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Owning reviewer.
    pub reviewer_id: uuid::Uuid,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Time-box expiry.
    pub expires_at: DateTime<Utc>,
    /// Outcome, if finalized.
    pub action: Option<String>,
    /// Reviewer feedback, if any.
    pub feedback: Option<String>,
    /// Close timestamp, if closed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Query result row for correction records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = review_changes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewChangeRow {
    /// Change record identifier.
    pub id: uuid::Uuid,
    /// Owning review.
    pub review_id: uuid::Uuid,
    /// Corrected dimension.
    pub dimension_id: uuid::Uuid,
    /// Answer as the annotator left it.
    pub original: Value,
    /// Answer as the reviewer corrected it.
    pub corrected: Value,
    /// Optional reason for the correction.
    pub reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for correction records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = review_changes)]
pub struct NewReviewChangeRow {
    /// Change record identifier.
    pub id: uuid::Uuid,
    /// Owning review.
    pub review_id: uuid::Uuid,
    /// Corrected dimension.
    pub dimension_id: uuid::Uuid,
    /// Answer as the annotator left it.
    pub original: Value,
    /// Answer as the reviewer corrected it.
    pub corrected: Value,
    /// Optional reason for the correction.
    pub reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
