//! Time-box expiry tests for task claims and reviews.
//!
//! Each test opens work under a clock pinned at the base instant and then
//! drives a second service pinned past the time box.

use crate::in_memory::helpers::{
    FrozenClock, REVIEW_TIME_MINUTES, Stores, TASK_TIME_MINUTES, add_annotator, runtime,
    seed_workspace, stores,
};
use cadenza::annotation::domain::{AnnotationStatus, DimensionAnswer};
use cadenza::annotation::ports::AnnotationRepository;
use cadenza::annotation::services::AnnotationWorkflowError;
use cadenza::review::domain::ReviewDomainError;
use cadenza::review::services::ReviewEngineError;
use cadenza::task::domain::{TaskDomainError, TaskStatus};
use cadenza::task::ports::TaskRepository;
use rstest::rstest;
use std::io;
use tokio::runtime::Runtime;

/// Tests that a swept expired claim is re-offered, even to a different
/// annotator.
#[rstest]
fn expired_claims_return_to_the_pool(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let task_id = workspace.task_ids[0];
    rt.block_on(stores.claim_service(clock).open(task_id, workspace.annotator))
        .expect("claim");

    let later = clock.advanced_by_minutes(TASK_TIME_MINUTES + 1);
    let late_service = stores.claim_service(later);
    let released = rt
        .block_on(late_service.release_expired(workspace.project_id))
        .expect("sweep");
    assert_eq!(released, 1);

    let colleague = add_annotator(&rt, &stores, later, workspace.project_id);
    let offered = rt
        .block_on(late_service.next(workspace.project_id, colleague))
        .expect("queue lookup")
        .expect("task offer");
    assert_eq!(offered.id(), task_id);
    assert_eq!(offered.status(), TaskStatus::Pending);
}

/// Tests that the expiry sweep is idempotent: claims are released once and
/// a repeat sweep finds nothing.
#[rstest]
fn expiry_sweep_is_idempotent(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 2);
    let claims = stores.claim_service(clock);
    rt.block_on(claims.open(workspace.task_ids[0], workspace.annotator))
        .expect("claim");

    let later = clock.advanced_by_minutes(TASK_TIME_MINUTES + 1);
    let sweeper = stores.claim_service(later);
    let released = rt
        .block_on(sweeper.release_expired(workspace.project_id))
        .expect("sweep");
    assert_eq!(released, 1);

    let repeat = rt
        .block_on(sweeper.release_expired(workspace.project_id))
        .expect("sweep");
    assert_eq!(repeat, 0);

    let task = rt
        .block_on(stores.tasks.find_by_id(workspace.task_ids[0]))
        .expect("task lookup")
        .expect("task");
    assert_eq!(task.status(), TaskStatus::Pending);
    assert!(task.assigned_to().is_none());
}

/// Tests that a draft save after expiry fails, releases the task, and
/// writes nothing.
#[rstest]
fn late_draft_saves_are_rejected(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let task_id = workspace.task_ids[0];
    rt.block_on(stores.claim_service(clock).open(task_id, workspace.annotator))
        .expect("claim");

    let later = clock.advanced_by_minutes(TASK_TIME_MINUTES + 1);
    let result = rt.block_on(stores.annotation_service(later).save_draft(
        task_id,
        workspace.annotator,
        vec![(workspace.fluency, DimensionAnswer::Scale(3))],
    ));
    assert!(matches!(
        result,
        Err(AnnotationWorkflowError::TaskDomain(
            TaskDomainError::ClaimExpired(_)
        ))
    ));

    let task = rt
        .block_on(stores.tasks.find_by_id(task_id))
        .expect("task lookup")
        .expect("task");
    assert_eq!(task.status(), TaskStatus::Pending);
    let annotation = rt
        .block_on(stores.annotations.find_by_task(task_id))
        .expect("annotation lookup");
    assert!(annotation.is_none());
}

/// Tests that a submission after expiry fails, resets the task, and records
/// no annotation.
#[rstest]
fn late_submissions_are_rejected(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let task_id = workspace.task_ids[0];
    rt.block_on(stores.claim_service(clock).open(task_id, workspace.annotator))
        .expect("claim");

    let later = clock.advanced_by_minutes(TASK_TIME_MINUTES + 1);
    let result = rt.block_on(stores.annotation_service(later).submit(
        task_id,
        workspace.annotator,
        vec![
            (workspace.quality, DimensionAnswer::Categorical("clear".into())),
            (workspace.fluency, DimensionAnswer::Scale(4)),
        ],
    ));
    assert!(matches!(
        result,
        Err(AnnotationWorkflowError::TaskDomain(
            TaskDomainError::ClaimExpired(_)
        ))
    ));

    let task = rt
        .block_on(stores.tasks.find_by_id(task_id))
        .expect("task lookup")
        .expect("task");
    assert_eq!(task.status(), TaskStatus::Pending);
    let annotation = rt
        .block_on(stores.annotations.find_by_task(task_id))
        .expect("annotation lookup");
    assert!(annotation.is_none(), "No submission should be recorded");
}

/// Tests that an expired review is abandoned on approval and the annotation
/// returns to the queue for another attempt.
#[rstest]
fn expired_reviews_requeue_the_annotation(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let task_id = workspace.task_ids[0];
    rt.block_on(stores.claim_service(clock).open(task_id, workspace.annotator))
        .expect("claim");
    rt.block_on(stores.annotation_service(clock).submit(
        task_id,
        workspace.annotator,
        vec![(workspace.fluency, DimensionAnswer::Scale(3))],
    ))
    .expect("submission");
    let review = rt
        .block_on(
            stores
                .review_service(clock)
                .next(workspace.project_id, workspace.reviewer),
        )
        .expect("queue lookup")
        .expect("review offer");

    let later = clock.advanced_by_minutes(REVIEW_TIME_MINUTES + 1);
    let late_service = stores.review_service(later);
    let result = rt.block_on(late_service.approve(
        review.id(),
        workspace.reviewer,
        None,
        Vec::new(),
    ));
    assert!(matches!(
        result,
        Err(ReviewEngineError::Domain(ReviewDomainError::ReviewExpired(_)))
    ));

    let annotation = rt
        .block_on(stores.annotations.find_by_id(review.annotation_id()))
        .expect("annotation lookup")
        .expect("annotation");
    assert_eq!(annotation.status(), AnnotationStatus::Submitted);

    // The same reviewer can pick the annotation up again on a fresh review.
    let reopened = rt
        .block_on(late_service.next(workspace.project_id, workspace.reviewer))
        .expect("queue lookup")
        .expect("review offer");
    assert_eq!(reopened.annotation_id(), review.annotation_id());
    assert_ne!(reopened.id(), review.id());
}
