//! Review queue, correction, and approval flow tests.

use crate::in_memory::helpers::{
    FrozenClock, Stores, Workspace, runtime, seed_workspace, stores,
};
use cadenza::annotation::domain::{AnnotationStatus, DimensionAnswer};
use cadenza::annotation::ports::AnnotationRepository;
use cadenza::batch::domain::BatchStatus;
use cadenza::batch::ports::BatchRepository;
use cadenza::review::domain::{ReviewAction, ReviewDomainError};
use cadenza::review::ports::ReviewRepository;
use cadenza::review::services::{ReviewCorrection, ReviewEngineError};
use cadenza::task::domain::TaskStatus;
use cadenza::task::ports::TaskRepository;
use rstest::rstest;
use std::io;
use tokio::runtime::Runtime;

/// Claims, annotates, and submits every seeded task for the workspace
/// annotator.
fn submit_all_tasks(rt: &Runtime, stores: &Stores, clock: FrozenClock, workspace: &Workspace) {
    let claims = stores.claim_service(clock);
    let annotations = stores.annotation_service(clock);
    for task_id in &workspace.task_ids {
        rt.block_on(claims.open(*task_id, workspace.annotator))
            .expect("claim");
        rt.block_on(annotations.submit(
            *task_id,
            workspace.annotator,
            vec![
                (workspace.quality, DimensionAnswer::Categorical("noisy".into())),
                (workspace.fluency, DimensionAnswer::Scale(2)),
            ],
        ))
        .expect("submission");
    }
}

/// Walks the reviewer's flow: the queue hands out the submitted annotation,
/// a correction is applied with an audit record, and approval finalizes the
/// review, annotation, and task together.
#[rstest]
fn review_with_correction_and_approval(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    submit_all_tasks(&rt, &stores, clock, &workspace);
    let service = stores.review_service(clock);

    let review = rt
        .block_on(service.next(workspace.project_id, workspace.reviewer))
        .expect("queue lookup")
        .expect("review offer");
    let under_review = rt
        .block_on(stores.annotations.find_by_id(review.annotation_id()))
        .expect("annotation lookup")
        .expect("annotation");
    assert_eq!(under_review.status(), AnnotationStatus::UnderReview);

    let approved = rt
        .block_on(service.approve(
            review.id(),
            workspace.reviewer,
            Some("good pass overall".into()),
            vec![ReviewCorrection {
                dimension_id: workspace.fluency,
                corrected: DimensionAnswer::Scale(3),
                reason: Some("hesitations are natural pauses".into()),
            }],
        ))
        .expect("approval");
    assert_eq!(approved.action(), Some(ReviewAction::Approved));

    let values = rt
        .block_on(stores.annotations.list_values(review.annotation_id()))
        .expect("value lookup");
    let fluency_value = values
        .iter()
        .find(|value| value.dimension_id() == workspace.fluency)
        .expect("fluency value");
    assert_eq!(*fluency_value.answer(), DimensionAnswer::Scale(3));

    let changes = rt
        .block_on(stores.reviews.list_changes(review.id()))
        .expect("change lookup");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].original, DimensionAnswer::Scale(2));

    let task = rt
        .block_on(stores.tasks.find_by_id(workspace.task_ids[0]))
        .expect("task lookup")
        .expect("task");
    assert_eq!(task.status(), TaskStatus::Approved);
}

/// Tests the aggregation invariant: counters always mirror the task rows,
/// and the batch completes exactly when its last task is resolved.
#[rstest]
fn batch_completes_when_the_last_task_is_approved(
    runtime: io::Result<Runtime>,
    stores: Stores,
) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 2);
    submit_all_tasks(&rt, &stores, clock, &workspace);
    let service = stores.review_service(clock);

    for expected_approved in 1..=2_u32 {
        let review = rt
            .block_on(service.next(workspace.project_id, workspace.reviewer))
            .expect("queue lookup")
            .expect("review offer");
        rt.block_on(service.approve(review.id(), workspace.reviewer, None, Vec::new()))
            .expect("approval");

        let batch = rt
            .block_on(stores.batches.find_by_id(workspace.batch_id))
            .expect("batch lookup")
            .expect("batch");
        assert_eq!(batch.counters().approved_tasks, expected_approved);
        assert_eq!(batch.counters().completed_tasks, expected_approved);
    }

    let batch = rt
        .block_on(stores.batches.find_by_id(workspace.batch_id))
        .expect("batch lookup")
        .expect("batch");
    assert_eq!(batch.status(), BatchStatus::Completed);
    assert!(batch.counters().is_fully_completed());
}

/// Tests that an approval is final; repeating it is rejected.
#[rstest]
fn double_approval_is_rejected(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    submit_all_tasks(&rt, &stores, clock, &workspace);
    let service = stores.review_service(clock);
    let review = rt
        .block_on(service.next(workspace.project_id, workspace.reviewer))
        .expect("queue lookup")
        .expect("review offer");
    rt.block_on(service.approve(review.id(), workspace.reviewer, None, Vec::new()))
        .expect("approval");

    let result =
        rt.block_on(service.approve(review.id(), workspace.reviewer, None, Vec::new()));
    assert!(matches!(
        result,
        Err(ReviewEngineError::Domain(ReviewDomainError::AlreadyClosed(_)))
    ));

    let task = rt
        .block_on(stores.tasks.find_by_id(workspace.task_ids[0]))
        .expect("task lookup")
        .expect("task");
    assert_eq!(
        task.status(),
        TaskStatus::Approved,
        "A rejected double-approve should not disturb the outcome"
    );
}

/// Tests that skipping a review returns the annotation to the queue for
/// other reviewers while hiding it from the skipper.
#[rstest]
fn skipped_reviews_return_to_the_queue(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    submit_all_tasks(&rt, &stores, clock, &workspace);
    let service = stores.review_service(clock);
    let review = rt
        .block_on(service.next(workspace.project_id, workspace.reviewer))
        .expect("queue lookup")
        .expect("review offer");

    rt.block_on(service.skip(
        review.id(),
        workspace.reviewer,
        "unfamiliar_dialect",
        None,
    ))
    .expect("skip");

    let annotation = rt
        .block_on(stores.annotations.find_by_id(review.annotation_id()))
        .expect("annotation lookup")
        .expect("annotation");
    assert_eq!(annotation.status(), AnnotationStatus::Submitted);

    let offered = rt
        .block_on(service.next(workspace.project_id, workspace.reviewer))
        .expect("queue lookup");
    assert!(offered.is_none(), "Skipper should not see the annotation again");
}
