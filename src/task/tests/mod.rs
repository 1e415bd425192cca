//! Unit tests for the task context.

mod service_tests;
