//! Per-dimension annotation values.

use super::AnnotationId;
use crate::project::domain::DimensionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answer for one dimension.
///
/// The two arms mirror the two dimension kinds, so a value can never carry
/// both a categorical choice and a scale point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DimensionAnswer {
    /// Selected choice of a categorical dimension.
    Categorical(String),
    /// Point on a numeric-scale dimension.
    Scale(i32),
}

impl DimensionAnswer {
    /// Returns the kind discriminant as stored.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Categorical(_) => "categorical",
            Self::Scale(_) => "scale",
        }
    }
}

/// One stored annotation value, keyed by (annotation, dimension).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationValue {
    annotation_id: AnnotationId,
    dimension_id: DimensionId,
    answer: DimensionAnswer,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AnnotationValue {
    /// Creates a new value timestamped at `now`.
    #[must_use]
    pub const fn new(
        annotation_id: AnnotationId,
        dimension_id: DimensionId,
        answer: DimensionAnswer,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            annotation_id,
            dimension_id,
            answer,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a value from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        annotation_id: AnnotationId,
        dimension_id: DimensionId,
        answer: DimensionAnswer,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            annotation_id,
            dimension_id,
            answer,
            created_at,
            updated_at,
        }
    }

    /// Returns the owning annotation identifier.
    #[must_use]
    pub const fn annotation_id(&self) -> AnnotationId {
        self.annotation_id
    }

    /// Returns the answered dimension identifier.
    #[must_use]
    pub const fn dimension_id(&self) -> DimensionId {
        self.dimension_id
    }

    /// Returns the answer.
    #[must_use]
    pub const fn answer(&self) -> &DimensionAnswer {
        &self.answer
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the answer, stamping the update at `now`.
    pub fn set_answer(&mut self, answer: DimensionAnswer, now: DateTime<Utc>) {
        self.answer = answer;
        self.updated_at = now;
    }
}
