//! Annotation capture workflow.
//!
//! An annotation is one annotator's work product for one task: a set of
//! per-dimension answers saved as drafts and eventually submitted for
//! review. Answers are validated against the project's dimension schema
//! before any write. The module follows hexagonal architecture:
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
