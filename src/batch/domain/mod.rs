//! Domain model for batch publication and statistics.
//!
//! Batch counters are derived, never authoritative: they are recomputed from
//! task rows whenever a member task is created, mutated, or deleted, and the
//! batch auto-completes when every task reaches a completed status.

mod batch;
mod error;
mod ids;

pub use batch::{Batch, BatchCounters, BatchStatus, PersistedBatchData};
pub use error::{BatchDomainError, ParseBatchStatusError};
pub use ids::BatchId;
