//! Batch aggregate root, status machine, and derived counters.

use super::{BatchDomainError, BatchId, ParseBatchStatusError};
use crate::project::domain::ProjectId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Batch lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Batch is being assembled; member tasks are not claimable.
    Draft,
    /// Batch is open for claims but no claim has been made yet.
    Published,
    /// At least one task has been claimed.
    InProgress,
    /// Claims are suspended.
    Paused,
    /// Every member task reached a completed status.
    Completed,
}

impl BatchStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Returns whether the state machine permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Published)
                | (Self::Published, Self::InProgress | Self::Paused)
                | (Self::InProgress, Self::Paused | Self::Completed)
                | (Self::Paused, Self::Published | Self::Completed)
        )
    }

    /// Returns whether member tasks may be claimed in this status.
    #[must_use]
    pub const fn is_claimable(self) -> bool {
        matches!(self, Self::Published | Self::InProgress)
    }
}

impl TryFrom<&str> for BatchStatus {
    type Error = ParseBatchStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseBatchStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived task counts for one batch.
///
/// `completed_tasks` counts every task whose status is completed, approved,
/// or rejected; the three are disjoint, so `approved_tasks` and
/// `rejected_tasks` are subsets of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounters {
    /// Total member tasks, regardless of status.
    pub total_tasks: u32,
    /// Tasks whose status is completed, approved, or rejected.
    pub completed_tasks: u32,
    /// Tasks whose status is approved.
    pub approved_tasks: u32,
    /// Tasks whose status is rejected.
    pub rejected_tasks: u32,
}

impl BatchCounters {
    /// Returns whether every member task is completed (and at least one
    /// exists).
    #[must_use]
    pub const fn is_fully_completed(self) -> bool {
        self.total_tasks > 0 && self.completed_tasks >= self.total_tasks
    }

    /// Returns the completion percentage, zero for an empty batch.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        clippy::float_arithmetic,
        reason = "completion percentage is a derived display value"
    )]
    pub fn completion_percentage(self) -> f32 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        (self.completed_tasks as f32 / self.total_tasks as f32) * 100.0
    }
}

/// Batch aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    project_id: ProjectId,
    name: String,
    status: BatchStatus,
    counters: BatchCounters,
    completion_percentage: f32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted batch aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedBatchData {
    /// Persisted batch identifier.
    pub id: BatchId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Persisted batch name.
    pub name: String,
    /// Persisted lifecycle status.
    pub status: BatchStatus,
    /// Persisted derived counters.
    pub counters: BatchCounters,
    /// Persisted completion percentage.
    pub completion_percentage: f32,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted completion timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Batch {
    /// Creates a new draft batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchDomainError::EmptyBatchName`] when the name is empty
    /// after trimming.
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, BatchDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BatchDomainError::EmptyBatchName);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: BatchId::new(),
            project_id,
            name: trimmed.to_owned(),
            status: BatchStatus::Draft,
            counters: BatchCounters::default(),
            completion_percentage: 0.0,
            created_at: timestamp,
            updated_at: timestamp,
            completed_at: None,
        })
    }

    /// Reconstructs a batch from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBatchData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            name: data.name,
            status: data.status,
            counters: data.counters,
            completion_percentage: data.completion_percentage,
            created_at: data.created_at,
            updated_at: data.updated_at,
            completed_at: data.completed_at,
        }
    }

    /// Returns the batch identifier.
    #[must_use]
    pub const fn id(&self) -> BatchId {
        self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the batch name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> BatchStatus {
        self.status
    }

    /// Returns the derived counters.
    #[must_use]
    pub const fn counters(&self) -> BatchCounters {
        self.counters
    }

    /// Returns the stored completion percentage.
    #[must_use]
    pub const fn completion_percentage(&self) -> f32 {
        self.completion_percentage
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

    /// Returns the completion timestamp, if the batch has completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Publishes the batch, opening member tasks for claims.
    ///
    /// # Errors
    ///
    /// Returns [`BatchDomainError::EmptyBatch`] when the batch has no tasks,
    /// or [`BatchDomainError::InvalidStateTransition`] when the batch is not
    /// a draft.
    pub fn publish(&mut self, clock: &impl Clock) -> Result<(), BatchDomainError> {
        if self.counters.total_tasks == 0 {
            return Err(BatchDomainError::EmptyBatch(self.id));
        }
        self.transition_to(BatchStatus::Published, clock)
    }

    /// Records that a member task has been claimed.
    ///
    /// A `published` batch moves to `in_progress`; a batch already in
    /// progress is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BatchDomainError::InvalidStateTransition`] when the batch is
    /// in neither claimable status.
    pub fn begin_progress(&mut self, clock: &impl Clock) -> Result<(), BatchDomainError> {
        if self.status == BatchStatus::InProgress {
            return Ok(());
        }
        self.transition_to(BatchStatus::InProgress, clock)
    }

    /// Suspends claims on the batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchDomainError::InvalidStateTransition`] when the batch is
    /// not in a claimable status.
    pub fn pause(&mut self, clock: &impl Clock) -> Result<(), BatchDomainError> {
        self.transition_to(BatchStatus::Paused, clock)
    }

    /// Resumes a paused batch.
    ///
    /// Lands on `completed` when the counters already show full completion,
    /// otherwise on `published`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchDomainError::InvalidStateTransition`] when the batch is
    /// not paused.
    pub fn resume(&mut self, clock: &impl Clock) -> Result<(), BatchDomainError> {
        if self.counters.is_fully_completed() {
            self.transition_to(BatchStatus::Completed, clock)?;
            self.completed_at = Some(self.updated_at);
            return Ok(());
        }
        self.transition_to(BatchStatus::Published, clock)
    }

    /// Checks whether deletion is permitted from the current status.
    ///
    /// # Errors
    ///
    /// Returns [`BatchDomainError::DeleteNotPermitted`] unless the batch is
    /// `draft` or `completed`.
    pub const fn ensure_deletable(&self) -> Result<(), BatchDomainError> {
        match self.status {
            BatchStatus::Draft | BatchStatus::Completed => Ok(()),
            status => Err(BatchDomainError::DeleteNotPermitted {
                batch_id: self.id,
                status: status.as_str(),
            }),
        }
    }

    /// Replaces the derived counters with a fresh aggregate.
    ///
    /// Auto-completes the batch when it is `in_progress` and every member
    /// task has reached a completed status.
    pub fn apply_counters(&mut self, counters: BatchCounters, clock: &impl Clock) {
        self.counters = counters;
        self.completion_percentage = counters.completion_percentage();
        self.touch(clock);
        if self.status == BatchStatus::InProgress && counters.is_fully_completed() {
            self.status = BatchStatus::Completed;
            self.completed_at = Some(self.updated_at);
        }
    }

    fn transition_to(
        &mut self,
        target: BatchStatus,
        clock: &impl Clock,
    ) -> Result<(), BatchDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(BatchDomainError::InvalidStateTransition {
                batch_id: self.id,
                from: self.status.as_str(),
                to: target.as_str(),
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
