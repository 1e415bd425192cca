//! Service layer for batch lifecycle and counter aggregation.

mod lifecycle;

pub use lifecycle::{BatchLifecycleError, BatchLifecycleResult, BatchLifecycleService};
