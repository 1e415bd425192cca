//! Service orchestration tests for project lifecycle operations.

use std::sync::Arc;

use crate::project::{
    adapters::memory::InMemoryProjectRepository,
    domain::{DimensionSchema, MemberRole, ProjectDomainError, ProjectStatus, UserId},
    services::{CreateProjectRequest, ProjectLifecycleError, ProjectLifecycleService},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = ProjectLifecycleService<InMemoryProjectRepository, DefaultClock>;

#[fixture]
fn service() -> TestService {
    ProjectLifecycleService::new(
        Arc::new(InMemoryProjectRepository::new()),
        Arc::new(DefaultClock),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_persists_a_draft_project(service: TestService) {
    let project = service
        .create(CreateProjectRequest::new("Speaker traits", 30, 15))
        .await
        .expect("project creation should succeed");

    assert_eq!(project.status(), ProjectStatus::Draft);
    let fetched = service
        .find_by_id(project.id())
        .await
        .expect("lookup should succeed");
    assert_eq!(fetched, Some(project));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activate_requires_a_configured_dimension(service: TestService) {
    let project = service
        .create(CreateProjectRequest::new("Speaker traits", 30, 15))
        .await
        .expect("project creation should succeed");

    let result = service.activate(project.id()).await;
    assert!(matches!(
        result,
        Err(ProjectLifecycleError::Domain(
            ProjectDomainError::MissingDimensions(_)
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activate_succeeds_once_a_dimension_exists(service: TestService) {
    let project = service
        .create(CreateProjectRequest::new("Speaker traits", 30, 15))
        .await
        .expect("project creation should succeed");
    service
        .add_dimension(
            project.id(),
            "clarity",
            DimensionSchema::numeric_scale(1, 5).expect("valid schema"),
        )
        .await
        .expect("dimension creation should succeed");

    let activated = service
        .activate(project.id())
        .await
        .expect("activation should succeed");
    assert_eq!(activated.status(), ProjectStatus::Active);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn membership_can_be_granted_and_revoked(service: TestService) {
    let project = service
        .create(CreateProjectRequest::new("Speaker traits", 30, 15))
        .await
        .expect("project creation should succeed");
    let user = UserId::new();

    let member = service
        .add_member(project.id(), user, MemberRole::Annotator)
        .await
        .expect("membership grant should succeed");
    assert!(member.active);
    assert!(member.role.can_annotate());
    assert!(!member.role.can_review());

    let revoked = service
        .deactivate_member(project.id(), user)
        .await
        .expect("membership revocation should succeed");
    assert!(!revoked.active);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_rejects_invalid_moves(service: TestService) {
    let project = service
        .create(CreateProjectRequest::new("Speaker traits", 30, 15))
        .await
        .expect("project creation should succeed");

    let result = service
        .transition(project.id(), ProjectStatus::Completed)
        .await;
    assert!(matches!(
        result,
        Err(ProjectLifecycleError::Domain(
            ProjectDomainError::InvalidStateTransition { .. }
        ))
    ));
}
