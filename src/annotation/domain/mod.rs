//! Domain model for annotations and their per-dimension values.

mod annotation;
mod error;
mod ids;
mod validation;
mod value;

pub use annotation::{Annotation, AnnotationStatus, PersistedAnnotationData};
pub use error::{AnnotationDomainError, ParseAnnotationStatusError};
pub use ids::AnnotationId;
pub use validation::{AnnotationValidationError, validate_answers};
pub use value::{AnnotationValue, DimensionAnswer};
