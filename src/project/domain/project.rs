//! Project aggregate root and lifecycle state machine.

use super::{ParseProjectStatusError, ProjectDomainError, ProjectId};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Project is being configured and is not yet open for work.
    Draft,
    /// Project is open: batches may be published and work claimed.
    Active,
    /// Project is temporarily closed to new claims.
    Paused,
    /// All planned work is finished.
    Completed,
    /// Project is retired and read-only.
    Archived,
}

impl ProjectStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Returns whether the state machine permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Active | Self::Archived)
                | (Self::Active, Self::Paused | Self::Completed)
                | (Self::Paused, Self::Active | Self::Completed)
                | (Self::Completed, Self::Archived)
        )
    }

    /// Returns whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Archived)
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = ParseProjectStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseProjectStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, non-empty project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    /// Creates a validated project name.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyProjectName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyProjectName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positive number of minutes used to time-box a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeBoxMinutes(u32);

impl TimeBoxMinutes {
    /// Creates a validated time box.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidTimeBox`] when the value is zero.
    pub const fn new(minutes: u32) -> Result<Self, ProjectDomainError> {
        if minutes == 0 {
            return Err(ProjectDomainError::InvalidTimeBox(minutes));
        }
        Ok(Self(minutes))
    }

    /// Returns the raw number of minutes.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the time box as a [`Duration`].
    #[must_use]
    pub fn duration(self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

/// Project aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: ProjectName,
    status: ProjectStatus,
    task_time: TimeBoxMinutes,
    review_time: TimeBoxMinutes,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted project aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Persisted project identifier.
    pub id: ProjectId,
    /// Persisted project name.
    pub name: ProjectName,
    /// Persisted lifecycle status.
    pub status: ProjectStatus,
    /// Persisted annotation time box.
    pub task_time: TimeBoxMinutes,
    /// Persisted review time box.
    pub review_time: TimeBoxMinutes,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new draft project.
    #[must_use]
    pub fn new(
        name: ProjectName,
        task_time: TimeBoxMinutes,
        review_time: TimeBoxMinutes,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ProjectId::new(),
            name,
            status: ProjectStatus::Draft,
            task_time,
            review_time,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            status: data.status,
            task_time: data.task_time,
            review_time: data.review_time,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project name.
    #[must_use]
    pub const fn name(&self) -> &ProjectName {
        &self.name
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the time box applied to task claims.
    #[must_use]
    pub const fn task_time(&self) -> TimeBoxMinutes {
        self.task_time
    }

    /// Returns the time box applied to reviews.
    #[must_use]
    pub const fn review_time(&self) -> TimeBoxMinutes {
        self.review_time
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

    /// Moves the project to `Active`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::MissingDimensions`] when the project has
    /// no configured annotation dimension, or
    /// [`ProjectDomainError::InvalidStateTransition`] when the current status
    /// does not permit activation.
    pub fn activate(
        &mut self,
        dimension_count: usize,
        clock: &impl Clock,
    ) -> Result<(), ProjectDomainError> {
        if dimension_count == 0 {
            return Err(ProjectDomainError::MissingDimensions(self.id));
        }
        self.transition_to(ProjectStatus::Active, clock)
    }

    /// Moves the project to the requested status.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidStateTransition`] when the state
    /// machine rejects the move.
    pub fn transition_to(
        &mut self,
        target: ProjectStatus,
        clock: &impl Clock,
    ) -> Result<(), ProjectDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(ProjectDomainError::InvalidStateTransition {
                project_id: self.id,
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
