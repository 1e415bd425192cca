//! Claim queue and assignment flow tests.
//!
//! Exercises queue ordering, concurrent claims, and skip exclusions through
//! the public services only.

use crate::in_memory::helpers::{
    FrozenClock, Stores, add_annotator, runtime, seed_workspace, stores,
};
use cadenza::batch::domain::BatchStatus;
use cadenza::batch::ports::BatchRepository;
use cadenza::project::domain::UserId;
use cadenza::task::domain::{TaskDomainError, TaskStatus};
use cadenza::task::services::ClaimEngineError;
use rstest::rstest;
use std::io;
use tokio::runtime::Runtime;

/// Walks the happy path: the queue offers the oldest task, the claim pins
/// it to the user, and the owning batch moves into progress.
#[rstest]
fn queue_offer_and_claim(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 2);
    let service = stores.claim_service(clock);

    let offered = rt
        .block_on(service.next(workspace.project_id, workspace.annotator))
        .expect("queue lookup")
        .expect("task offer");
    assert_eq!(offered.id(), workspace.task_ids[0]);
    assert_eq!(offered.status(), TaskStatus::Pending);

    let claimed = rt
        .block_on(service.open(offered.id(), workspace.annotator))
        .expect("claim");
    assert_eq!(claimed.status(), TaskStatus::Assigned);
    assert_eq!(claimed.assigned_to(), Some(workspace.annotator));

    let batch = rt
        .block_on(stores.batches.find_by_id(workspace.batch_id))
        .expect("batch lookup")
        .expect("batch");
    assert_eq!(batch.status(), BatchStatus::InProgress);
}

/// Tests that a claim race has exactly one winner; the loser keeps polling.
#[rstest]
fn concurrent_claims_have_one_winner(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 2);
    let rival = add_annotator(&rt, &stores, clock, workspace.project_id);
    let service = stores.claim_service(clock);
    let contested = workspace.task_ids[0];

    rt.block_on(service.open(contested, workspace.annotator))
        .expect("winning claim");
    let result = rt.block_on(service.open(contested, rival));
    assert!(
        matches!(
            result,
            Err(ClaimEngineError::Domain(TaskDomainError::NotClaimant { .. }))
        ),
        "Loser of the claim race should be turned away"
    );

    let offered = rt
        .block_on(service.next(workspace.project_id, rival))
        .expect("queue lookup")
        .expect("task offer");
    assert_eq!(
        offered.id(),
        workspace.task_ids[1],
        "Loser should be offered the next task instead"
    );
}

/// Tests that a skipped task stays claimable for everyone but the skipper.
#[rstest]
fn skipped_tasks_remain_available_to_others(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let colleague = add_annotator(&rt, &stores, clock, workspace.project_id);
    let service = stores.claim_service(clock);
    let task_id = workspace.task_ids[0];

    rt.block_on(service.open(task_id, workspace.annotator))
        .expect("claim");
    let skipped = rt
        .block_on(service.skip(
            task_id,
            workspace.annotator,
            "corrupt_audio",
            Some("clipping throughout".into()),
        ))
        .expect("skip");
    assert_eq!(skipped.status(), TaskStatus::Pending);

    let for_skipper = rt
        .block_on(service.next(workspace.project_id, workspace.annotator))
        .expect("queue lookup");
    assert!(for_skipper.is_none(), "Skipper should not see the task again");

    let for_colleague = rt
        .block_on(service.next(workspace.project_id, colleague))
        .expect("queue lookup")
        .expect("task offer");
    assert_eq!(for_colleague.id(), task_id);
}

/// Tests that non-members and inactive members cannot enter the queue.
#[rstest]
fn queue_is_closed_to_non_annotators(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 1);
    let service = stores.claim_service(clock);

    let outsider = rt.block_on(service.next(workspace.project_id, UserId::new()));
    assert!(matches!(
        outsider,
        Err(ClaimEngineError::PermissionDenied { .. })
    ));

    let reviewer_only = rt.block_on(service.next(workspace.project_id, workspace.reviewer));
    assert!(
        matches!(
            reviewer_only,
            Err(ClaimEngineError::PermissionDenied { .. })
        ),
        "A reviewer-only member should not claim annotation work"
    );
}

/// Tests that the queue resumes an existing claim instead of handing out a
/// second task.
#[rstest]
fn queue_resumes_the_active_claim(runtime: io::Result<Runtime>, stores: Stores) {
    let rt = runtime.expect("runtime creation");
    let clock = FrozenClock::base();
    let workspace = seed_workspace(&rt, &stores, clock, 3);
    let service = stores.claim_service(clock);

    let first = rt
        .block_on(service.open(workspace.task_ids[1], workspace.annotator))
        .expect("claim");

    let resumed = rt
        .block_on(service.next(workspace.project_id, workspace.annotator))
        .expect("queue lookup")
        .expect("resumed claim");
    assert_eq!(resumed.id(), first.id());
    assert_eq!(resumed.status(), TaskStatus::Assigned);
}
