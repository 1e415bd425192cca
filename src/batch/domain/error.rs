//! Error types for batch domain validation and parsing.

use super::BatchId;
use thiserror::Error;

/// Errors returned while constructing or mutating batch domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchDomainError {
    /// The batch name is empty after trimming.
    #[error("batch name must not be empty")]
    EmptyBatchName,

    /// The requested status change is not permitted by the state machine.
    #[error("invalid batch state transition for {batch_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Batch whose transition was rejected.
        batch_id: BatchId,
        /// Status the batch currently holds.
        from: &'static str,
        /// Status that was requested.
        to: &'static str,
    },

    /// Publication requires at least one member task.
    #[error("batch {0} cannot be published without tasks")]
    EmptyBatch(BatchId),

    /// Deletion is only permitted from draft or completed status.
    #[error("batch {batch_id} cannot be deleted while {status}")]
    DeleteNotPermitted {
        /// Batch whose deletion was rejected.
        batch_id: BatchId,
        /// Status blocking the deletion.
        status: &'static str,
    },
}

/// Error returned while parsing batch statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown batch status: {0}")]
pub struct ParseBatchStatusError(pub String);
