//! Adapter implementations for the review context ports.

pub mod memory;
pub mod postgres;
