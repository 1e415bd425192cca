//! Batch publication control and derived statistics.
//!
//! A batch groups tasks for publication: work only enters the claim pool
//! once its batch is published, and batch-level counters are recomputed from
//! task state on every relevant mutation. The module follows hexagonal
//! architecture:
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
