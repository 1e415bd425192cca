//! Port contracts for the project context.
//!
//! Ports define infrastructure-agnostic interfaces used by project services
//! and by the claim/review engines that consult project configuration.

pub mod repository;

pub use repository::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult};
