//! Error types for annotation domain validation and parsing.

use super::AnnotationId;
use thiserror::Error;

/// Errors returned while mutating annotation domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnnotationDomainError {
    /// The requested status change is not permitted by the state machine.
    #[error("invalid annotation state transition for {annotation_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Annotation whose transition was rejected.
        annotation_id: AnnotationId,
        /// Status the annotation currently holds.
        from: &'static str,
        /// Status that was requested.
        to: &'static str,
    },
}

/// Error returned while parsing annotation statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown annotation status: {0}")]
pub struct ParseAnnotationStatusError(pub String);
