//! In-memory adapters for review persistence.

mod repository;

pub use repository::InMemoryReviewRepository;
