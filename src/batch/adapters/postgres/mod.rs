//! `PostgreSQL` adapters for batch persistence.

mod models;
mod repository;
mod schema;

pub use repository::{BatchPgPool, PostgresBatchRepository};
