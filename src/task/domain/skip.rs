//! Skip ledger entries.

use super::{ParseSkipTargetError, SkipActivityId, TaskDomainError, TaskId};
use crate::annotation::domain::AnnotationId;
use crate::project::domain::{ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The work item a skip entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SkipTarget {
    /// An annotation task the user declined to work on.
    Task(TaskId),
    /// A submitted annotation the user declined to review.
    Review(AnnotationId),
}

impl SkipTarget {
    /// Returns the canonical storage representation of the target kind.
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Task(_) => "task",
            Self::Review(_) => "review",
        }
    }

    /// Returns the UUID of the targeted record.
    #[must_use]
    pub const fn target_id(self) -> uuid::Uuid {
        match self {
            Self::Task(id) => id.into_inner(),
            Self::Review(id) => id.into_inner(),
        }
    }

    /// Reconstructs a target from its persisted kind and UUID.
    ///
    /// # Errors
    ///
    /// Returns [`ParseSkipTargetError`] when `kind` names no known target
    /// kind.
    pub fn from_parts(kind: &str, id: uuid::Uuid) -> Result<Self, ParseSkipTargetError> {
        match kind {
            "task" => Ok(Self::Task(TaskId::from_uuid(id))),
            "review" => Ok(Self::Review(AnnotationId::from_uuid(id))),
            _ => Err(ParseSkipTargetError(kind.to_owned())),
        }
    }
}

/// Validated, non-empty reason attached to a skip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipReason(String);

impl SkipReason {
    /// Creates a validated skip reason.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptySkipReason`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptySkipReason);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the reason as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One append-only record of a user declining a work item.
///
/// The ledger is never pruned; claim and review queues exclude any item the
/// acting user has ever skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipActivity {
    id: SkipActivityId,
    project_id: ProjectId,
    user_id: UserId,
    target: SkipTarget,
    reason: SkipReason,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl SkipActivity {
    /// Creates a new ledger entry timestamped at `now`.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        user_id: UserId,
        target: SkipTarget,
        reason: SkipReason,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SkipActivityId::new(),
            project_id,
            user_id,
            target,
            reason,
            description,
            created_at: now,
        }
    }

    /// Reconstructs a ledger entry from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: SkipActivityId,
        project_id: ProjectId,
        user_id: UserId,
        target: SkipTarget,
        reason: SkipReason,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            user_id,
            target,
            reason,
            description,
            created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> SkipActivityId {
        self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the skipping user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the skipped work item.
    #[must_use]
    pub const fn target(&self) -> SkipTarget {
        self.target
    }

    /// Returns the skip reason.
    #[must_use]
    pub const fn reason(&self) -> &SkipReason {
        &self.reason
    }

    /// Returns the free-text elaboration, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
