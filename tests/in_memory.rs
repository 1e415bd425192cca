//! In-memory end-to-end tests for the annotation lifecycle.
//!
//! Tests are organized into modules by flow:
//! - `claim_flow_tests`: Queue selection, claiming, skips
//! - `annotation_flow_tests`: Draft saves, validation, submission
//! - `review_flow_tests`: Review queue, corrections, approval, aggregation
//! - `expiry_tests`: Time-box expiry for task claims and reviews

mod in_memory {
    pub mod helpers;

    mod annotation_flow_tests;
    mod claim_flow_tests;
    mod expiry_tests;
    mod review_flow_tests;
}
