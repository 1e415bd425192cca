//! In-memory adapters for annotation persistence.

mod repository;

pub use repository::InMemoryAnnotationRepository;
