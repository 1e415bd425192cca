//! Unit tests for the review context.
