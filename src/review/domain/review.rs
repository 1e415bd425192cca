//! Review aggregate root and correction records.

use super::{ParseReviewActionError, ReviewDomainError, ReviewId};
use crate::annotation::domain::{AnnotationId, DimensionAnswer};
use crate::project::domain::{DimensionId, ProjectId, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a finalized review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// The annotation was accepted, possibly with corrections.
    Approved,
    /// The annotation was rejected.
    Rejected,
}

impl ReviewAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for ReviewAction {
    type Error = ParseReviewActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseReviewActionError(value.to_owned())),
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review aggregate root.
///
/// Open while `completed_at` is unset; a closed review either carries an
/// action (finalized) or none (abandoned by skip or expiry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    id: ReviewId,
    annotation_id: AnnotationId,
    project_id: ProjectId,
    reviewer_id: UserId,
    started_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    action: Option<ReviewAction>,
    feedback: Option<String>,
    completed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted review aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReviewData {
    /// Persisted review identifier.
    pub id: ReviewId,
    /// Reviewed annotation.
    pub annotation_id: AnnotationId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Owning reviewer.
    pub reviewer_id: UserId,
    /// Persisted start timestamp.
    pub started_at: DateTime<Utc>,
    /// Persisted time-box expiry.
    pub expires_at: DateTime<Utc>,
    /// Persisted outcome, if finalized.
    pub action: Option<ReviewAction>,
    /// Persisted reviewer feedback, if any.
    pub feedback: Option<String>,
    /// Persisted close timestamp, if closed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Opens a new time-boxed review started at `now`.
    #[must_use]
    pub fn new(
        annotation_id: AnnotationId,
        project_id: ProjectId,
        reviewer_id: UserId,
        time_box: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReviewId::new(),
            annotation_id,
            project_id,
            reviewer_id,
            started_at: now,
            expires_at: now + time_box,
            action: None,
            feedback: None,
            completed_at: None,
        }
    }

    /// Reconstructs a review from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedReviewData) -> Self {
        Self {
            id: data.id,
            annotation_id: data.annotation_id,
            project_id: data.project_id,
            reviewer_id: data.reviewer_id,
            started_at: data.started_at,
            expires_at: data.expires_at,
            action: data.action,
            feedback: data.feedback,
            completed_at: data.completed_at,
        }
    }

    /// Returns the review identifier.
    #[must_use]
    pub const fn id(&self) -> ReviewId {
        self.id
    }

    /// Returns the reviewed annotation identifier.
    #[must_use]
    pub const fn annotation_id(&self) -> AnnotationId {
        self.annotation_id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the owning reviewer.
    #[must_use]
    pub const fn reviewer_id(&self) -> UserId {
        self.reviewer_id
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the time-box expiry.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the outcome, if finalized.
    #[must_use]
    pub const fn action(&self) -> Option<ReviewAction> {
        self.action
    }

    /// Returns the reviewer feedback, if any.
    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Returns the close timestamp, if closed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns whether the review is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }

    /// Returns whether the open review's time box has elapsed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.expires_at < now
    }

    /// Verifies that `user` owns the review.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::NotReviewOwner`] when `user` is not the
    /// reviewer.
    pub fn ensure_owned_by(&self, user: UserId) -> Result<(), ReviewDomainError> {
        if self.reviewer_id != user {
            return Err(ReviewDomainError::NotReviewOwner {
                review_id: self.id,
                user_id: user,
            });
        }
        Ok(())
    }

    /// Finalizes the review with the given action and feedback.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::AlreadyClosed`] when the review is no
    /// longer open, or [`ReviewDomainError::ReviewExpired`] when the time
    /// box elapsed (the review is abandoned as a side effect).
    pub fn finalize(
        &mut self,
        action: ReviewAction,
        feedback: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ReviewDomainError> {
        if self.is_expired(now) {
            self.abandon(now)?;
            return Err(ReviewDomainError::ReviewExpired(self.id));
        }
        if !self.is_open() {
            return Err(ReviewDomainError::AlreadyClosed(self.id));
        }
        self.action = Some(action);
        self.feedback = feedback;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Closes the review without an outcome (skip or expiry).
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::AlreadyClosed`] when the review is no
    /// longer open.
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<(), ReviewDomainError> {
        if !self.is_open() {
            return Err(ReviewDomainError::AlreadyClosed(self.id));
        }
        self.completed_at = Some(now);
        Ok(())
    }
}

/// One recorded correction made during a review.
///
/// Append-only audit trail: the original answer, the corrected answer, and
/// an optional reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewChange {
    /// Owning review.
    pub review_id: ReviewId,
    /// Corrected dimension.
    pub dimension_id: DimensionId,
    /// Answer as the annotator left it.
    pub original: DimensionAnswer,
    /// Answer as the reviewer corrected it.
    pub corrected: DimensionAnswer,
    /// Optional reason for the correction.
    pub reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
