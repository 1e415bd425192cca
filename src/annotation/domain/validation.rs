//! Validation of annotation answers against the project's dimension schema.

use super::DimensionAnswer;
use crate::project::domain::{AnnotationDimension, DimensionId, DimensionKind};
use thiserror::Error;

/// Errors produced while validating an answer payload.
///
/// Validation runs before any write; a failing payload leaves annotation
/// state untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnnotationValidationError {
    /// The payload names a dimension the project does not configure.
    #[error("unknown dimension: {0}")]
    UnknownDimension(DimensionId),

    /// The payload names the same dimension twice.
    #[error("duplicate answer for dimension {0}")]
    DuplicateDimension(DimensionId),

    /// The answer kind does not match the dimension kind.
    #[error("dimension {dimension_id} expects a {expected} answer")]
    WrongAnswerKind {
        /// Dimension being answered.
        dimension_id: DimensionId,
        /// Kind the dimension's schema expects.
        expected: &'static str,
    },

    /// The categorical choice is not among the configured values.
    #[error("dimension {dimension_id} has no configured choice {choice:?}")]
    UnconfiguredChoice {
        /// Dimension being answered.
        dimension_id: DimensionId,
        /// Rejected choice.
        choice: String,
    },

    /// The scale point lies outside the configured bounds.
    #[error("dimension {dimension_id} scale does not include {point}")]
    OutOfRangeScalePoint {
        /// Dimension being answered.
        dimension_id: DimensionId,
        /// Rejected point.
        point: i32,
    },
}

/// Validates a full answer payload against the configured dimensions.
///
/// # Errors
///
/// Returns the first [`AnnotationValidationError`] encountered; the payload
/// order decides which failure surfaces when several apply.
pub fn validate_answers(
    dimensions: &[AnnotationDimension],
    answers: &[(DimensionId, DimensionAnswer)],
) -> Result<(), AnnotationValidationError> {
    let mut seen: Vec<DimensionId> = Vec::with_capacity(answers.len());
    for (dimension_id, answer) in answers {
        if seen.contains(dimension_id) {
            return Err(AnnotationValidationError::DuplicateDimension(*dimension_id));
        }
        seen.push(*dimension_id);
        let dimension = dimensions
            .iter()
            .find(|dimension| dimension.id() == *dimension_id)
            .ok_or(AnnotationValidationError::UnknownDimension(*dimension_id))?;
        validate_answer(dimension, answer)?;
    }
    Ok(())
}

fn validate_answer(
    dimension: &AnnotationDimension,
    answer: &DimensionAnswer,
) -> Result<(), AnnotationValidationError> {
    match (dimension.kind(), answer) {
        (DimensionKind::Categorical, DimensionAnswer::Categorical(choice)) => {
            if dimension.schema().allows_choice(choice) {
                Ok(())
            } else {
                Err(AnnotationValidationError::UnconfiguredChoice {
                    dimension_id: dimension.id(),
                    choice: choice.clone(),
                })
            }
        }
        (DimensionKind::NumericScale, DimensionAnswer::Scale(point)) => {
            if dimension.schema().allows_scale_point(*point) {
                Ok(())
            } else {
                Err(AnnotationValidationError::OutOfRangeScalePoint {
                    dimension_id: dimension.id(),
                    point: *point,
                })
            }
        }
        (DimensionKind::Categorical, DimensionAnswer::Scale(_)) => {
            Err(AnnotationValidationError::WrongAnswerKind {
                dimension_id: dimension.id(),
                expected: "categorical",
            })
        }
        (DimensionKind::NumericScale, DimensionAnswer::Categorical(_)) => {
            Err(AnnotationValidationError::WrongAnswerKind {
                dimension_id: dimension.id(),
                expected: "scale",
            })
        }
    }
}
