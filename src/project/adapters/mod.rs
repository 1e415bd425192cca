//! Adapter implementations for the project context ports.

pub mod memory;
pub mod postgres;
