//! Review engine.
//!
//! A review is a reviewer's time-boxed evaluation of one submitted
//! annotation. The engine hands out submitted annotations oldest-first,
//! tracks corrections as an audit trail, and finalizes the annotation and
//! its task in one operation. The module follows hexagonal architecture:
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
