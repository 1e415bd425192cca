//! Domain model for project configuration and lifecycle.
//!
//! The project domain models the project status gate (a project cannot go
//! active without at least one annotation dimension), the dimension schema
//! used to validate annotation values, and the member roster with roles,
//! while keeping infrastructure concerns outside the domain boundary.

mod dimension;
mod error;
mod ids;
mod member;
mod project;

pub use dimension::{
    AnnotationDimension, DimensionKind, DimensionSchema, DimensionValue, PersistedDimensionData,
    ScaleBounds,
};
pub use error::{ParseMemberRoleError, ParseProjectStatusError, ProjectDomainError};
pub use ids::{DimensionId, ProjectId, UserId};
pub use member::{MemberRole, ProjectMember};
pub use project::{PersistedProjectData, Project, ProjectName, ProjectStatus, TimeBoxMinutes};
