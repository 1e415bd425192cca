//! Port contracts for task persistence and the skip ledger.

mod repository;
mod skip_ledger;

pub use repository::{TaskMutation, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use skip_ledger::{SkipLedger, SkipLedgerError, SkipLedgerResult};
