//! Service layer for the claim/assignment engine.

mod claim;

pub use claim::{ClaimEngineError, ClaimEngineResult, ClaimEngineService};
