//! In-memory adapters for the project context.

mod repository;

pub use repository::InMemoryProjectRepository;
