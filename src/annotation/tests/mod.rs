//! Unit tests for the annotation context.

mod domain_tests;
