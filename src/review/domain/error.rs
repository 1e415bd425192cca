//! Error types for review domain validation and parsing.

use super::ReviewId;
use crate::project::domain::UserId;
use thiserror::Error;

/// Errors returned while mutating review domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewDomainError {
    /// The review was already finalized or abandoned.
    #[error("review {0} is already closed")]
    AlreadyClosed(ReviewId),

    /// The review's time box elapsed; it has been abandoned.
    #[error("review {0} expired")]
    ReviewExpired(ReviewId),

    /// The acting user does not own the review.
    #[error("user {user_id} does not own review {review_id}")]
    NotReviewOwner {
        /// Review being operated on.
        review_id: ReviewId,
        /// User attempting the operation.
        user_id: UserId,
    },
}

/// Error returned while parsing review actions from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown review action: {0}")]
pub struct ParseReviewActionError(pub String);
