//! `PostgreSQL` adapters for annotation persistence.

mod models;
mod repository;
mod schema;

pub use repository::{AnnotationPgPool, PostgresAnnotationRepository};
