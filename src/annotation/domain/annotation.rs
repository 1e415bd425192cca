//! Annotation aggregate root and status machine.

use super::{AnnotationDomainError, AnnotationId, ParseAnnotationStatusError};
use crate::project::domain::{ProjectId, UserId};
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Annotation lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    /// Being worked on; values may still change.
    Draft,
    /// Submitted and waiting for a reviewer.
    Submitted,
    /// A reviewer holds an open review on it.
    UnderReview,
    /// Review approved it.
    Approved,
    /// Review rejected it.
    Rejected,
}

impl AnnotationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl TryFrom<&str> for AnnotationStatus {
    type Error = ParseAnnotationStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "under_review" => Ok(Self::UnderReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseAnnotationStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for AnnotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annotation aggregate root.
///
/// One annotator's work product for one task. Values live alongside it as
/// child records, one per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    task_id: TaskId,
    project_id: ProjectId,
    annotator_id: UserId,
    status: AnnotationStatus,
    submitted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted annotation aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAnnotationData {
    /// Persisted annotation identifier.
    pub id: AnnotationId,
    /// Annotated task.
    pub task_id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Authoring annotator.
    pub annotator_id: UserId,
    /// Persisted lifecycle status.
    pub status: AnnotationStatus,
    /// Persisted submission timestamp, if any.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Annotation {
    /// Creates a new draft annotation timestamped at `now`.
    #[must_use]
    pub fn new(task_id: TaskId, project_id: ProjectId, annotator_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: AnnotationId::new(),
            task_id,
            project_id,
            annotator_id,
            status: AnnotationStatus::Draft,
            submitted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs an annotation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAnnotationData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            project_id: data.project_id,
            annotator_id: data.annotator_id,
            status: data.status,
            submitted_at: data.submitted_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the annotation identifier.
    #[must_use]
    pub const fn id(&self) -> AnnotationId {
        self.id
    }

    /// Returns the annotated task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the authoring annotator.
    #[must_use]
    pub const fn annotator_id(&self) -> UserId {
        self.annotator_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> AnnotationStatus {
        self.status
    }

    /// Returns the submission timestamp, if submitted.
    #[must_use]
    pub const fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the draft as touched at `now` without changing status.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationDomainError::InvalidStateTransition`] when the
    /// annotation is no longer a draft.
    pub fn touch_draft(&mut self, now: DateTime<Utc>) -> Result<(), AnnotationDomainError> {
        if self.status != AnnotationStatus::Draft {
            return Err(self.invalid_transition(AnnotationStatus::Draft));
        }
        self.updated_at = now;
        Ok(())
    }

    /// Submits the draft for review.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationDomainError::InvalidStateTransition`] when the
    /// annotation is not a draft.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), AnnotationDomainError> {
        if self.status != AnnotationStatus::Draft {
            return Err(self.invalid_transition(AnnotationStatus::Submitted));
        }
        self.status = AnnotationStatus::Submitted;
        self.submitted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Moves a submitted annotation under an open review.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationDomainError::InvalidStateTransition`] when the
    /// annotation is not submitted.
    pub fn begin_review(&mut self, now: DateTime<Utc>) -> Result<(), AnnotationDomainError> {
        if self.status != AnnotationStatus::Submitted {
            return Err(self.invalid_transition(AnnotationStatus::UnderReview));
        }
        self.status = AnnotationStatus::UnderReview;
        self.updated_at = now;
        Ok(())
    }

    /// Returns the annotation to the review queue after its open review
    /// was skipped or expired.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationDomainError::InvalidStateTransition`] when the
    /// annotation is not under review.
    pub fn revert_to_submitted(&mut self, now: DateTime<Utc>) -> Result<(), AnnotationDomainError> {
        if self.status != AnnotationStatus::UnderReview {
            return Err(self.invalid_transition(AnnotationStatus::Submitted));
        }
        self.status = AnnotationStatus::Submitted;
        self.updated_at = now;
        Ok(())
    }

    /// Finalizes the annotation as approved.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationDomainError::InvalidStateTransition`] when the
    /// annotation is not under review.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), AnnotationDomainError> {
        self.finalize(AnnotationStatus::Approved, now)
    }

    /// Finalizes the annotation as rejected.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationDomainError::InvalidStateTransition`] when the
    /// annotation is not under review.
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), AnnotationDomainError> {
        self.finalize(AnnotationStatus::Rejected, now)
    }

    fn finalize(
        &mut self,
        target: AnnotationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), AnnotationDomainError> {
        if self.status != AnnotationStatus::UnderReview {
            return Err(self.invalid_transition(target));
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    const fn invalid_transition(&self, target: AnnotationStatus) -> AnnotationDomainError {
        AnnotationDomainError::InvalidStateTransition {
            annotation_id: self.id,
            from: self.status.as_str(),
            to: target.as_str(),
        }
    }
}
