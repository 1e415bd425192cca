//! Application services for project configuration and lifecycle.

mod lifecycle;

pub use lifecycle::{
    CreateProjectRequest, ProjectLifecycleError, ProjectLifecycleResult, ProjectLifecycleService,
};
