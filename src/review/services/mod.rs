//! Service layer for the review engine.

mod engine;

pub use engine::{ReviewCorrection, ReviewEngineError, ReviewEngineResult, ReviewEngineService};
