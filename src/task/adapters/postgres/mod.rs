//! `PostgreSQL` adapters for task persistence and the skip ledger.

mod models;
mod repository;
mod schema;
mod skip_ledger;

pub use repository::{PostgresTaskRepository, TaskPgPool};
pub use skip_ledger::PostgresSkipLedger;
