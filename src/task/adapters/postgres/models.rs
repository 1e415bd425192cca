//! Diesel row models for task persistence and the skip ledger.

use super::schema::{skip_activities, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Owning batch, if any.
    pub batch_id: Option<uuid::Uuid>,
    /// Audio file reference.
    pub audio_file: String,
    /// Lifecycle status.
    pub status: String,
    /// Current claimant, if any.
    pub assigned_to: Option<uuid::Uuid>,
    /// Claim timestamp, if claimed.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Claim expiry, if claimed.
    pub expires_at: Option<DateTime<Utc>>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Owning batch, if any.
    pub batch_id: Option<uuid::Uuid>,
    /// Audio file reference.
    pub audio_file: String,
    /// Lifecycle status.
    pub status: String,
    /// Current claimant, if any.
    pub assigned_to: Option<uuid::Uuid>,
    /// Claim timestamp, if claimed.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Claim expiry, if claimed.
    pub expires_at: Option<DateTime<Utc>>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for skip ledger entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = skip_activities)]
pub struct NewSkipActivityRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Skipping user.
    pub user_id: uuid::Uuid,
    /// Target kind.
    pub activity_type: String,
    /// Skipped task or annotation identifier.
    pub target_id: uuid::Uuid,
    /// Skip reason.
    pub reason: String,
    /// Free-text elaboration, if any.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
