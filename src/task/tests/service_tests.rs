//! Service orchestration tests for the claim engine.

use std::sync::Arc;

use crate::batch::{
    adapters::memory::InMemoryBatchRepository,
    domain::{Batch, BatchCounters, BatchId, BatchStatus},
    ports::BatchRepository,
};
use crate::project::{
    adapters::memory::InMemoryProjectRepository,
    domain::{MemberRole, Project, ProjectId, ProjectMember, ProjectName, TimeBoxMinutes, UserId},
    ports::ProjectRepository,
};
use crate::task::{
    adapters::memory::{InMemorySkipLedger, InMemoryTaskRepository},
    domain::{AudioFileRef, Task, TaskDomainError, TaskId, TaskStatus},
    ports::TaskRepository,
    services::{ClaimEngineError, ClaimEngineService},
};
use crate::test_support::FixedClock;
use mockable::Clock;
use rstest::{fixture, rstest};

const TASK_TIME_MINUTES: u32 = 30;

type TestService = ClaimEngineService<
    InMemoryTaskRepository,
    InMemoryBatchRepository,
    InMemoryProjectRepository,
    InMemorySkipLedger,
    FixedClock,
>;

/// Shared in-memory stores so services pinned at different instants can
/// observe the same state.
struct Env {
    tasks: Arc<InMemoryTaskRepository>,
    batches: Arc<InMemoryBatchRepository>,
    projects: Arc<InMemoryProjectRepository>,
    skips: Arc<InMemorySkipLedger>,
}

impl Env {
    fn service_at(&self, clock: FixedClock) -> TestService {
        ClaimEngineService::new(
            Arc::clone(&self.tasks),
            Arc::clone(&self.batches),
            Arc::clone(&self.projects),
            Arc::clone(&self.skips),
            Arc::new(clock),
        )
    }

    async fn seed_project(&self, annotator: UserId, clock: &FixedClock) -> ProjectId {
        let mut project = Project::new(
            ProjectName::new("quality-audit").expect("valid project name"),
            TimeBoxMinutes::new(TASK_TIME_MINUTES).expect("valid time box"),
            TimeBoxMinutes::new(60).expect("valid time box"),
            clock,
        );
        project.activate(1, clock).expect("activation should succeed");
        self.projects
            .store(&project)
            .await
            .expect("project store should succeed");
        let member = ProjectMember::new(project.id(), annotator, MemberRole::Annotator, clock);
        self.projects
            .upsert_member(&member)
            .await
            .expect("member store should succeed");
        project.id()
    }

    async fn seed_published_batch(&self, project_id: ProjectId, clock: &FixedClock) -> BatchId {
        let mut batch = Batch::new(project_id, "batch-01", clock).expect("valid batch name");
        batch.apply_counters(
            BatchCounters {
                total_tasks: 1,
                completed_tasks: 0,
                approved_tasks: 0,
                rejected_tasks: 0,
            },
            clock,
        );
        batch.publish(clock).expect("publish should succeed");
        self.batches
            .store(&batch)
            .await
            .expect("batch store should succeed");
        batch.id()
    }

    async fn seed_pending_task(
        &self,
        project_id: ProjectId,
        batch_id: BatchId,
        audio: &str,
        clock: &FixedClock,
    ) -> TaskId {
        let mut task = Task::new(
            project_id,
            Some(batch_id),
            AudioFileRef::new(audio).expect("valid audio reference"),
            clock,
        );
        task.publish(clock.utc()).expect("publish should succeed");
        self.tasks
            .store(&task)
            .await
            .expect("task store should succeed");
        task.id()
    }
}

#[fixture]
fn env() -> Env {
    Env {
        tasks: Arc::new(InMemoryTaskRepository::new()),
        batches: Arc::new(InMemoryBatchRepository::new()),
        projects: Arc::new(InMemoryProjectRepository::new()),
        skips: Arc::new(InMemorySkipLedger::new()),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn next_returns_none_when_no_batch_admits_claims(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;

    let offered = env
        .service_at(clock)
        .next(project_id, annotator)
        .await
        .expect("queue lookup should succeed");
    assert!(offered.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn next_rejects_a_user_without_an_annotator_role(env: Env) {
    let clock = FixedClock::base();
    let project_id = env.seed_project(UserId::new(), &clock).await;
    let outsider = UserId::new();

    let result = env.service_at(clock).next(project_id, outsider).await;
    assert!(matches!(
        result,
        Err(ClaimEngineError::PermissionDenied { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn next_offers_the_oldest_pending_task(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let older = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;
    env.seed_pending_task(
        project_id,
        batch_id,
        "audio/clip-002.wav",
        &clock.advanced_by_minutes(5),
    )
    .await;

    let offered = env
        .service_at(clock.advanced_by_minutes(10))
        .next(project_id, annotator)
        .await
        .expect("queue lookup should succeed")
        .expect("a task should be offered");
    assert_eq!(offered.id(), older);
    assert_eq!(offered.status(), TaskStatus::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn equal_age_tasks_are_offered_in_a_stable_order(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let first = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;
    let second = env
        .seed_pending_task(project_id, batch_id, "audio/clip-002.wav", &clock)
        .await;
    // Creation timestamps tie, so the identifier decides.
    let expected = first.min(second);

    let service = env.service_at(clock);
    for _ in 0..2 {
        let offered = service
            .next(project_id, annotator)
            .await
            .expect("queue lookup should succeed")
            .expect("a task should be offered");
        assert_eq!(offered.id(), expected);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_claims_the_task_and_starts_batch_progress(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let task_id = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;

    let task = env
        .service_at(clock)
        .open(task_id, annotator)
        .await
        .expect("claim should succeed");

    assert_eq!(task.status(), TaskStatus::Assigned);
    assert_eq!(task.assigned_to(), Some(annotator));
    assert_eq!(
        task.expires_at(),
        Some(clock.utc() + chrono::Duration::minutes(i64::from(TASK_TIME_MINUTES)))
    );
    let batch = env
        .batches
        .find_by_id(batch_id)
        .await
        .expect("lookup should succeed")
        .expect("batch should exist");
    assert_eq!(batch.status(), BatchStatus::InProgress);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_rejects_a_task_held_by_another_user(env: Env) {
    let clock = FixedClock::base();
    let first = UserId::new();
    let second = UserId::new();
    let project_id = env.seed_project(first, &clock).await;
    let member = ProjectMember::new(project_id, second, MemberRole::Annotator, &clock);
    env.projects
        .upsert_member(&member)
        .await
        .expect("member store should succeed");
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let task_id = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;

    let service = env.service_at(clock);
    service
        .open(task_id, first)
        .await
        .expect("first claim should succeed");

    let result = service.open(task_id, second).await;
    assert!(matches!(
        result,
        Err(ClaimEngineError::Domain(TaskDomainError::NotClaimant { .. }))
    ));
    let task = env
        .tasks
        .find_by_id(task_id)
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(task.assigned_to(), Some(first));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn next_resumes_an_unexpired_claim(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let claimed = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;
    env.seed_pending_task(project_id, batch_id, "audio/clip-002.wav", &clock)
        .await;

    let service = env.service_at(clock);
    service
        .open(claimed, annotator)
        .await
        .expect("claim should succeed");

    let resumed = service
        .next(project_id, annotator)
        .await
        .expect("queue lookup should succeed")
        .expect("the claim should be resumed");
    assert_eq!(resumed.id(), claimed);
    assert_eq!(resumed.status(), TaskStatus::Assigned);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn next_releases_an_expired_claim_and_reoffers_the_task(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let task_id = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;
    env.service_at(clock)
        .open(task_id, annotator)
        .await
        .expect("claim should succeed");

    let later = clock.advanced_by_minutes(i64::from(TASK_TIME_MINUTES) + 1);
    let offered = env
        .service_at(later)
        .next(project_id, annotator)
        .await
        .expect("queue lookup should succeed")
        .expect("the released task should be offered again");
    assert_eq!(offered.id(), task_id);
    assert_eq!(offered.status(), TaskStatus::Pending);
    assert!(offered.assigned_to().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn skip_records_the_reason_and_excludes_the_task_from_the_queue(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let task_id = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;

    let service = env.service_at(clock);
    service
        .open(task_id, annotator)
        .await
        .expect("claim should succeed");
    let skipped = service
        .skip(task_id, annotator, "corrupt_audio", Some("static only".into()))
        .await
        .expect("skip should succeed");
    assert_eq!(skipped.status(), TaskStatus::Pending);

    let offered = service
        .next(project_id, annotator)
        .await
        .expect("queue lookup should succeed");
    assert!(offered.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn skip_rejects_a_blank_reason_without_releasing_the_claim(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let task_id = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;

    let service = env.service_at(clock);
    service
        .open(task_id, annotator)
        .await
        .expect("claim should succeed");

    let result = service.skip(task_id, annotator, "  ", None).await;
    assert!(matches!(
        result,
        Err(ClaimEngineError::Domain(TaskDomainError::EmptySkipReason))
    ));
    let task = env
        .tasks
        .find_by_id(task_id)
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(task.status(), TaskStatus::Assigned);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn release_expired_sweeps_only_lapsed_claims(env: Env) {
    let clock = FixedClock::base();
    let annotator = UserId::new();
    let project_id = env.seed_project(annotator, &clock).await;
    let batch_id = env.seed_published_batch(project_id, &clock).await;
    let lapsed = env
        .seed_pending_task(project_id, batch_id, "audio/clip-001.wav", &clock)
        .await;
    env.service_at(clock)
        .open(lapsed, annotator)
        .await
        .expect("claim should succeed");

    let fresh = env
        .seed_pending_task(project_id, batch_id, "audio/clip-002.wav", &clock)
        .await;
    let midway = clock.advanced_by_minutes(i64::from(TASK_TIME_MINUTES) - 5);
    env.service_at(midway)
        .open(fresh, annotator)
        .await
        .expect("claim should succeed");

    let sweep_at = clock.advanced_by_minutes(i64::from(TASK_TIME_MINUTES) + 1);
    let released = env
        .service_at(sweep_at)
        .release_expired(project_id)
        .await
        .expect("sweep should succeed");
    assert_eq!(released, 1);

    let lapsed_task = env
        .tasks
        .find_by_id(lapsed)
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(lapsed_task.status(), TaskStatus::Pending);
    let fresh_task = env
        .tasks
        .find_by_id(fresh)
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(fresh_task.status(), TaskStatus::Assigned);

    let repeat = env
        .service_at(sweep_at)
        .release_expired(project_id)
        .await
        .expect("sweep should succeed");
    assert_eq!(repeat, 0);
}
