//! Annotation dimension schema types.
//!
//! A dimension describes one axis being annotated: either a categorical
//! question with a configured set of choices, or a numeric scale with
//! inclusive bounds. The schema is project-level configuration and is
//! read-only during task execution.

use super::{DimensionId, ProjectDomainError, ProjectId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Dimension kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    /// Answer is one of a configured set of choices.
    Categorical,
    /// Answer is an integer point on an inclusive scale.
    NumericScale,
}

impl DimensionKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::NumericScale => "numeric_scale",
        }
    }
}

/// One configured choice of a categorical dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValue {
    /// Canonical stored value.
    pub value: String,
    /// Optional human-readable label shown to annotators.
    pub label: Option<String>,
}

impl DimensionValue {
    /// Creates a validated choice.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyChoiceValue`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyChoiceValue);
        }
        Ok(Self {
            value: trimmed.to_owned(),
            label: None,
        })
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Inclusive bounds of a numeric-scale dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleBounds {
    min: i32,
    max: i32,
}

impl ScaleBounds {
    /// Creates validated scale bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidScaleBounds`] when `min` is not
    /// strictly below `max`.
    pub const fn new(min: i32, max: i32) -> Result<Self, ProjectDomainError> {
        if min >= max {
            return Err(ProjectDomainError::InvalidScaleBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub const fn min(self) -> i32 {
        self.min
    }

    /// Returns the inclusive upper bound.
    #[must_use]
    pub const fn max(self) -> i32 {
        self.max
    }

    /// Returns whether `point` lies within the bounds.
    #[must_use]
    pub const fn contains(self, point: i32) -> bool {
        point >= self.min && point <= self.max
    }
}

/// Validated per-kind dimension configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DimensionSchema {
    /// Categorical dimension with its configured choices.
    Categorical {
        /// Configured choices, at least one.
        choices: Vec<DimensionValue>,
    },
    /// Numeric-scale dimension with inclusive bounds.
    NumericScale {
        /// Configured bounds.
        bounds: ScaleBounds,
    },
}

impl DimensionSchema {
    /// Creates a categorical schema.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyCategoricalChoices`] when no choice
    /// is supplied.
    pub fn categorical(
        choices: impl IntoIterator<Item = DimensionValue>,
    ) -> Result<Self, ProjectDomainError> {
        let collected: Vec<DimensionValue> = choices.into_iter().collect();
        if collected.is_empty() {
            return Err(ProjectDomainError::EmptyCategoricalChoices);
        }
        Ok(Self::Categorical { choices: collected })
    }

    /// Creates a numeric-scale schema.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::InvalidScaleBounds`] when the bounds are
    /// empty.
    pub const fn numeric_scale(min: i32, max: i32) -> Result<Self, ProjectDomainError> {
        match ScaleBounds::new(min, max) {
            Ok(bounds) => Ok(Self::NumericScale { bounds }),
            Err(err) => Err(err),
        }
    }

    /// Returns the kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> DimensionKind {
        match self {
            Self::Categorical { .. } => DimensionKind::Categorical,
            Self::NumericScale { .. } => DimensionKind::NumericScale,
        }
    }

    /// Returns whether `candidate` is one of the configured categorical
    /// choices. Always false for numeric-scale schemas.
    #[must_use]
    pub fn allows_choice(&self, candidate: &str) -> bool {
        match self {
            Self::Categorical { choices } => choices.iter().any(|choice| choice.value == candidate),
            Self::NumericScale { .. } => false,
        }
    }

    /// Returns whether `point` lies within the configured scale. Always
    /// false for categorical schemas.
    #[must_use]
    pub const fn allows_scale_point(&self, point: i32) -> bool {
        match self {
            Self::Categorical { .. } => false,
            Self::NumericScale { bounds } => bounds.contains(point),
        }
    }
}

/// Annotation dimension aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDimension {
    id: DimensionId,
    project_id: ProjectId,
    name: String,
    schema: DimensionSchema,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDimensionData {
    /// Persisted dimension identifier.
    pub id: DimensionId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Persisted dimension name.
    pub name: String,
    /// Persisted schema payload.
    pub schema: DimensionSchema,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl AnnotationDimension {
    /// Creates a new dimension for a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyDimensionName`] when the name is
    /// empty after trimming.
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        schema: DimensionSchema,
        clock: &impl Clock,
    ) -> Result<Self, ProjectDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyDimensionName);
        }
        Ok(Self {
            id: DimensionId::new(),
            project_id,
            name: trimmed.to_owned(),
            schema,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a dimension from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedDimensionData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            name: data.name,
            schema: data.schema,
            created_at: data.created_at,
        }
    }

    /// Returns the dimension identifier.
    #[must_use]
    pub const fn id(&self) -> DimensionId {
        self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the dimension name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the per-kind configuration.
    #[must_use]
    pub const fn schema(&self) -> &DimensionSchema {
        &self.schema
    }

    /// Returns the kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> DimensionKind {
        self.schema.kind()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
