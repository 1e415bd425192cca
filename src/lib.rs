//! Cadenza: lifecycle core for crowd-sourced audio annotation and review.
//!
//! This crate implements the state machines and claim/review engines behind
//! an audio annotation platform: projects own annotation dimensions and
//! batches of tasks, annotators claim tasks under time limits and submit
//! per-dimension values, reviewers evaluate submissions in time-boxed
//! reviews, and batch-level counters stay synchronized with task state.
//!
//! # Architecture
//!
//! Cadenza follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, PostgreSQL)
//!
//! # Modules
//!
//! - [`project`]: Project lifecycle, annotation dimension schema, membership
//! - [`batch`]: Batch publication gates and derived statistics
//! - [`task`]: Task claim/assignment engine and the skip ledger
//! - [`annotation`]: Annotation draft/submit workflow
//! - [`review`]: Time-boxed review engine with correction audit trail
//!
//! The crate is a library-level contract only: HTTP routing, file storage,
//! export encoding, and authentication are left to the embedding application.

pub mod annotation;
pub mod batch;
pub mod project;
pub mod review;
pub mod task;

#[cfg(test)]
pub(crate) mod test_support;
