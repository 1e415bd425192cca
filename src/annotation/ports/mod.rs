//! Port contracts for annotation persistence.

mod repository;

pub use repository::{
    AnnotationMutation, AnnotationRepository, AnnotationRepositoryError, AnnotationRepositoryResult,
};
