//! Adapter implementations for the annotation context ports.

pub mod memory;
pub mod postgres;
