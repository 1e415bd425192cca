//! Task claim/assignment engine and the skip ledger.
//!
//! A task is one unit of work (one audio file) moving through
//! `pending -> assigned -> in_progress -> under_review -> approved`.
//! Claims are time-boxed: an expired claim is lazily reset to `pending` the
//! next time anyone touches the task, and an explicit skip returns the task
//! to the pool while recording a ledger entry that keeps the skipping user
//! from seeing it again. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
