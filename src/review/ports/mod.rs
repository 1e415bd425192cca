//! Port contracts for review persistence.

mod repository;

pub use repository::{
    ReviewMutation, ReviewRepository, ReviewRepositoryError, ReviewRepositoryResult,
};
