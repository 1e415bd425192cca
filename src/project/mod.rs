//! Project lifecycle, annotation dimension schema, and membership.
//!
//! A project owns the annotation dimensions (what must be annotated), the
//! batches of tasks, and the member roster that gates who may claim work.
//! The module follows hexagonal architecture:
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
