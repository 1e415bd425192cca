//! Error types for project domain validation and parsing.

use super::ids::ProjectId;
use thiserror::Error;

/// Errors returned while constructing or mutating project domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDomainError {
    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// A time-box setting is zero.
    #[error("time box must be a positive number of minutes, got {0}")]
    InvalidTimeBox(u32),

    /// The requested status change is not permitted by the state machine.
    #[error("invalid project state transition for {project_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Project whose transition was rejected.
        project_id: ProjectId,
        /// Status the project currently holds.
        from: &'static str,
        /// Status that was requested.
        to: &'static str,
    },

    /// Activation requires at least one configured annotation dimension.
    #[error("project {0} cannot be activated without an annotation dimension")]
    MissingDimensions(ProjectId),

    /// The dimension name is empty after trimming.
    #[error("dimension name must not be empty")]
    EmptyDimensionName,

    /// A categorical dimension was configured without any choices.
    #[error("categorical dimension must define at least one choice")]
    EmptyCategoricalChoices,

    /// A categorical choice value is empty after trimming.
    #[error("categorical choice value must not be empty")]
    EmptyChoiceValue,

    /// A numeric-scale dimension was configured with an empty range.
    #[error("numeric scale bounds are invalid: min {min} must be below max {max}")]
    InvalidScaleBounds {
        /// Configured lower bound.
        min: i32,
        /// Configured upper bound.
        max: i32,
    },
}

/// Error returned while parsing project statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown project status: {0}")]
pub struct ParseProjectStatusError(pub String);

/// Error returned while parsing member roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown member role: {0}")]
pub struct ParseMemberRoleError(pub String);
