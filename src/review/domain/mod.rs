//! Domain model for reviews and correction records.

mod error;
mod ids;
mod review;

pub use error::{ParseReviewActionError, ReviewDomainError};
pub use ids::ReviewId;
pub use review::{PersistedReviewData, Review, ReviewAction, ReviewChange};
