//! Service layer for the annotation workflow.

mod workflow;

pub use workflow::{
    AnnotationWorkflowError, AnnotationWorkflowResult, AnnotationWorkflowService,
};
