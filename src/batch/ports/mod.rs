//! Port contracts for the batch context.

pub mod repository;

pub use repository::{BatchRepository, BatchRepositoryError, BatchRepositoryResult};
