//! In-memory adapters for the batch context.

mod repository;

pub use repository::InMemoryBatchRepository;
