//! Unit tests for the project context.

mod service_tests;
