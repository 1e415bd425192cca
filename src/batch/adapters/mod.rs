//! Adapter implementations for the batch context ports.

pub mod memory;
pub mod postgres;
