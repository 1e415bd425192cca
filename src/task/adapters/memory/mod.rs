//! In-memory adapters for task persistence and the skip ledger.

mod repository;
mod skip_ledger;

pub use repository::InMemoryTaskRepository;
pub use skip_ledger::InMemorySkipLedger;
