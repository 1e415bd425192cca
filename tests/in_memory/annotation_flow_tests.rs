//! Annotation drafting and submission flow tests.

use crate::in_memory::helpers::{
    FrozenClock, Stores, add_annotator, runtime, seed_workspace, stores,
};
use cadenza::annotation::domain::{AnnotationStatus, AnnotationValidationError, DimensionAnswer};
use cadenza::annotation::ports::AnnotationRepository;
use cadenza::annotation::services::AnnotationWorkflowError;
use cadenza::batch::ports::BatchRepository;
use cadenza::task::domain::TaskStatus;
use cadenza::task::ports::TaskRepository;
use rstest::rstest;
use std::io;
use tokio::runtime::Runtime;

/// Walks the annotator's flow from claim to submission: draft saves
/// accumulate, the submission freezes the answers and parks the task for
/// review.
#[rstest]
fn draft_resave_and_submit(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let task_id = workspace.task_ids[0];
    rt.block_on(stores.claim_service(clock).open(task_id, workspace.annotator))
        .expect("claim");
    let service = stores.annotation_service(clock);

    let draft = rt
        .block_on(service.save_draft(
            task_id,
            workspace.annotator,
            vec![
                (workspace.quality, DimensionAnswer::Categorical("noisy".into())),
                (workspace.fluency, DimensionAnswer::Scale(4)),
            ],
        ))
        .expect("draft save");
    assert_eq!(draft.status(), AnnotationStatus::Draft);

    // Second save narrows the payload to one dimension.
    rt.block_on(service.save_draft(
        task_id,
        workspace.annotator,
        vec![(workspace.fluency, DimensionAnswer::Scale(2))],
    ))
    .expect("draft resave");
    let values = rt
        .block_on(stores.annotations.list_values(draft.id()))
        .expect("value lookup");
    assert_eq!(values.len(), 1);
    assert_eq!(*values[0].answer(), DimensionAnswer::Scale(2));

    let submitted = rt
        .block_on(service.submit(
            task_id,
            workspace.annotator,
            vec![
                (workspace.quality, DimensionAnswer::Categorical("clear".into())),
                (workspace.fluency, DimensionAnswer::Scale(3)),
            ],
        ))
        .expect("submission");
    assert_eq!(submitted.status(), AnnotationStatus::Submitted);

    let task = rt
        .block_on(stores.tasks.find_by_id(task_id))
        .expect("task lookup")
        .expect("task");
    assert_eq!(task.status(), TaskStatus::UnderReview);
}

/// Tests that schema violations reject the whole payload before any write.
#[rstest]
fn schema_violations_reject_the_payload(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let task_id = workspace.task_ids[0];
    rt.block_on(stores.claim_service(clock).open(task_id, workspace.annotator))
        .expect("claim");
    let service = stores.annotation_service(clock);

    let result = rt.block_on(service.save_draft(
        task_id,
        workspace.annotator,
        vec![
            (workspace.quality, DimensionAnswer::Categorical("clear".into())),
            (workspace.fluency, DimensionAnswer::Scale(7)),
        ],
    ));
    assert!(matches!(
        result,
        Err(AnnotationWorkflowError::Validation(
            AnnotationValidationError::OutOfRangeScalePoint { .. }
        ))
    ));

    let annotation = rt
        .block_on(stores.annotations.find_by_task(task_id))
        .expect("annotation lookup");
    assert!(
        annotation.is_none(),
        "A rejected payload should leave nothing behind"
    );
}

/// Tests that work on a skipped-and-reclaimed task is attributed to the new
/// claimant; the abandoned draft stays with its author.
#[rstest]
fn reclaimed_tasks_attribute_work_to_the_new_claimant(
    runtime: io::Result<Runtime>,
    stores: Stores,
) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let task_id = workspace.task_ids[0];
    let claims = stores.claim_service(clock);
    rt.block_on(claims.open(task_id, workspace.annotator))
        .expect("claim");
    rt.block_on(stores.annotation_service(clock).save_draft(
        task_id,
        workspace.annotator,
        vec![(workspace.fluency, DimensionAnswer::Scale(1))],
    ))
    .expect("draft save");
    rt.block_on(claims.skip(task_id, workspace.annotator, "background hum", None))
        .expect("skip");

    let colleague = add_annotator(&rt, &stores, clock, workspace.project_id);
    rt.block_on(claims.open(task_id, colleague)).expect("reclaim");
    let submitted = rt
        .block_on(stores.annotation_service(clock).submit(
            task_id,
            colleague,
            vec![(workspace.fluency, DimensionAnswer::Scale(5))],
        ))
        .expect("submission");
    assert_eq!(submitted.annotator_id(), colleague);

    let abandoned = rt
        .block_on(
            stores
                .annotations
                .find_by_task_and_annotator(task_id, workspace.annotator),
        )
        .expect("draft lookup")
        .expect("the original draft should survive");
    assert_eq!(abandoned.status(), AnnotationStatus::Draft);
    assert_ne!(abandoned.id(), submitted.id());
}

/// Tests that submission leaves batch completion counters untouched; only a
/// review outcome completes a task.
#[rstest]
fn submission_does_not_complete_the_batch(runtime: io::Result<Runtime>, stores: Stores) {
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

    let batch = rt
        .block_on(stores.batches.find_by_id(workspace.batch_id))
        .expect("batch lookup")
        .expect("batch");
    assert_eq!(batch.counters().completed_tasks, 0);
    assert!(!batch.counters().is_fully_completed());
}
