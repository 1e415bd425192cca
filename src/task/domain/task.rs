//! Task aggregate root and the claim state machine.

use super::{ParseTaskStatusError, TaskDomainError, TaskId};
use crate::batch::domain::BatchId;
use crate::project::domain::{ProjectId, UserId};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task sits in an unpublished batch and is not yet claimable.
    Draft,
    /// Task is in the claim pool.
    Pending,
    /// Task is claimed but work has not started.
    Assigned,
    /// The claimant is working on the task.
    InProgress,
    /// Task finished outside the review flow.
    Completed,
    /// An annotation was submitted and awaits review.
    UnderReview,
    /// Review approved the annotation.
    Approved,
    /// Review rejected the annotation.
    Rejected,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether the status carries an active claim.
    #[must_use]
    pub const fn is_active_claim(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }

    /// Returns whether the status counts towards batch completion.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed | Self::Approved | Self::Rejected)
    }

    /// Returns whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "under_review" => Ok(Self::UnderReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, non-empty reference to a stored audio file.
///
/// The actual object storage lives outside this crate; tasks carry an opaque
/// key into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFileRef(String);

impl AudioFileRef {
    /// Creates a validated audio file reference.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyAudioFile`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyAudioFile);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the reference as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task aggregate root.
///
/// Claim-engine methods take an explicit `now` timestamp rather than a clock
/// so that every timestamp written within one guarded mutation agrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    batch_id: Option<BatchId>,
    audio_file: AudioFileRef,
    status: TaskStatus,
    assigned_to: Option<UserId>,
    assigned_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Owning batch, if any.
    pub batch_id: Option<BatchId>,
    /// Persisted audio file reference.
    pub audio_file: AudioFileRef,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted claimant, if any.
    pub assigned_to: Option<UserId>,
    /// Persisted claim timestamp, if any.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Persisted claim expiry, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Persisted completion timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new draft task.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        batch_id: Option<BatchId>,
        audio_file: AudioFileRef,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            project_id,
            batch_id,
            audio_file,
            status: TaskStatus::Draft,
            assigned_to: None,
            assigned_at: None,
            expires_at: None,
            completed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            batch_id: data.batch_id,
            audio_file: data.audio_file,
            status: data.status,
            assigned_to: data.assigned_to,
            assigned_at: data.assigned_at,
            expires_at: data.expires_at,
            completed_at: data.completed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the owning batch identifier, if any.
    #[must_use]
    pub const fn batch_id(&self) -> Option<BatchId> {
        self.batch_id
    }

    /// Returns the audio file reference.
    #[must_use]
    pub const fn audio_file(&self) -> &AudioFileRef {
        &self.audio_file
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the current claimant, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns the claim timestamp, if any.
    #[must_use]
    pub const fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns the claim expiry, if any.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the completion timestamp, if any.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
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

    /// Returns whether the claim's time box has elapsed.
    ///
    /// Only meaningful while the status carries an active claim; false
    /// otherwise.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active_claim() && self.expires_at.is_some_and(|expiry| expiry < now)
    }

    /// Moves a draft task into the claim pool.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not a draft.
    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Draft {
            return Err(self.invalid_transition(TaskStatus::Pending));
        }
        self.status = TaskStatus::Pending;
        self.updated_at = now;
        Ok(())
    }

    /// Opens the task for `user`.
    ///
    /// A `pending` task is claimed: `assigned_to`/`assigned_at` are set and
    /// the claim is time-boxed by `time_box`. Re-opening one's own active
    /// claim marks work as started (`assigned` -> `in_progress`) and is
    /// idempotent thereafter.
    ///
    /// # Errors
    ///
    /// - [`TaskDomainError::ClaimExpired`] when the existing claim's time box
    ///   elapsed; the task is reset to `pending` as a side effect and the
    ///   caller should re-poll the queue.
    /// - [`TaskDomainError::NotClaimant`] when another user holds the claim.
    /// - [`TaskDomainError::ClaimConflict`] when the task is in no claimable
    ///   status.
    pub fn open(
        &mut self,
        user: UserId,
        time_box: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if self.is_expired(now) {
            self.release(now);
            return Err(TaskDomainError::ClaimExpired(self.id));
        }
        match self.status {
            TaskStatus::Pending => {
                self.status = TaskStatus::Assigned;
                self.assigned_to = Some(user);
                self.assigned_at = Some(now);
                self.expires_at = Some(now + time_box);
                self.updated_at = now;
                Ok(())
            }
            TaskStatus::Assigned if self.assigned_to == Some(user) => {
                self.status = TaskStatus::InProgress;
                self.updated_at = now;
                Ok(())
            }
            TaskStatus::InProgress if self.assigned_to == Some(user) => Ok(()),
            TaskStatus::Assigned | TaskStatus::InProgress => Err(TaskDomainError::NotClaimant {
                task_id: self.id,
                user_id: user,
            }),
            _ => Err(TaskDomainError::ClaimConflict(self.id)),
        }
    }

    /// Returns the task to the pool on an explicit skip by its claimant.
    ///
    /// This is the only path back to `pending` other than expiry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ClaimNotActive`] when the task carries no
    /// active claim, or [`TaskDomainError::NotClaimant`] when `user` does
    /// not hold it.
    pub fn skip_by(&mut self, user: UserId, now: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.ensure_claim_held_by(user)?;
        self.release(now);
        Ok(())
    }

    /// Lazily handles claim expiry: an expired active claim is reset to
    /// `pending` with assignment fields cleared.
    ///
    /// Idempotent — returns `true` only when a reset actually happened.
    pub fn handle_expiration(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) {
            self.release(now);
            return true;
        }
        false
    }

    /// Verifies that `user` holds an active, unexpired claim on the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ClaimExpired`] when the claim's time box
    /// elapsed (the task is reset as a side effect),
    /// [`TaskDomainError::ClaimNotActive`] when no claim is active, or
    /// [`TaskDomainError::NotClaimant`] when the claim is held by someone
    /// else.
    pub fn ensure_active_claim(
        &mut self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if self.is_expired(now) {
            self.release(now);
            return Err(TaskDomainError::ClaimExpired(self.id));
        }
        self.ensure_claim_held_by(user)
    }

    /// Moves the task under review after its annotation was submitted.
    ///
    /// # Errors
    ///
    /// Same guards as [`Task::ensure_active_claim`].
    pub fn submit(&mut self, user: UserId, now: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.ensure_active_claim(user, now)?;
        self.status = TaskStatus::UnderReview;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Finalizes the task as approved.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not under review.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.finalize(TaskStatus::Approved, now)
    }

    /// Finalizes the task as rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not under review.
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.finalize(TaskStatus::Rejected, now)
    }

    fn finalize(&mut self, target: TaskStatus, now: DateTime<Utc>) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::UnderReview {
            return Err(self.invalid_transition(target));
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    fn ensure_claim_held_by(&self, user: UserId) -> Result<(), TaskDomainError> {
        if !self.status.is_active_claim() {
            return Err(TaskDomainError::ClaimNotActive(self.id));
        }
        if self.assigned_to != Some(user) {
            return Err(TaskDomainError::NotClaimant {
                task_id: self.id,
                user_id: user,
            });
        }
        Ok(())
    }

    fn release(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Pending;
        self.assigned_to = None;
        self.assigned_at = None;
        self.expires_at = None;
        self.updated_at = now;
    }

    const fn invalid_transition(&self, target: TaskStatus) -> TaskDomainError {
        TaskDomainError::InvalidStateTransition {
            task_id: self.id,
            from: self.status.as_str(),
            to: target.as_str(),
        }
    }
}
