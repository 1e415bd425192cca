//! Shared test helpers for in-memory lifecycle integration tests.

use cadenza::annotation::adapters::memory::InMemoryAnnotationRepository;
use cadenza::annotation::services::AnnotationWorkflowService;
use cadenza::batch::adapters::memory::InMemoryBatchRepository;
use cadenza::batch::services::BatchLifecycleService;
use cadenza::project::adapters::memory::InMemoryProjectRepository;
use cadenza::project::domain::{
    DimensionId, DimensionSchema, DimensionValue, MemberRole, UserId,
};
use cadenza::project::services::{CreateProjectRequest, ProjectLifecycleService};
use cadenza::review::adapters::memory::InMemoryReviewRepository;
use cadenza::review::services::ReviewEngineService;
use cadenza::task::adapters::memory::{InMemorySkipLedger, InMemoryTaskRepository};
use cadenza::task::services::ClaimEngineService;
use cadenza::{batch::domain::BatchId, project::domain::ProjectId, task::domain::TaskId};
use chrono::{DateTime, Local, Utc};
use mockable::Clock;
use rstest::fixture;
use std::io;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Time box applied to task claims in seeded projects, in minutes.
pub const TASK_TIME_MINUTES: i64 = 30;

/// Time box applied to reviews in seeded projects, in minutes.
pub const REVIEW_TIME_MINUTES: i64 = 60;

/// Clock pinned to one instant so expiry can be exercised deterministically.
#[derive(Debug, Clone, Copy)]
pub struct FrozenClock(DateTime<Utc>);

impl FrozenClock {
    /// Clock pinned at an arbitrary but stable instant.
    #[must_use]
    pub fn base() -> Self {
        Self(
            DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
        )
    }

    /// Returns a clock advanced by `minutes`.
    #[must_use]
    pub fn advanced_by_minutes(self, minutes: i64) -> Self {
        Self(self.0 + chrono::Duration::minutes(minutes))
    }
}

impl Clock for FrozenClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Claim engine wired to in-memory stores.
pub type TestClaimService = ClaimEngineService<
    InMemoryTaskRepository,
    InMemoryBatchRepository,
    InMemoryProjectRepository,
    InMemorySkipLedger,
    FrozenClock,
>;

/// Annotation workflow wired to in-memory stores.
pub type TestAnnotationService = AnnotationWorkflowService<
    InMemoryAnnotationRepository,
    InMemoryTaskRepository,
    InMemoryProjectRepository,
    FrozenClock,
>;

/// Review engine wired to in-memory stores.
pub type TestReviewService = ReviewEngineService<
    InMemoryReviewRepository,
    InMemoryAnnotationRepository,
    InMemoryTaskRepository,
    InMemoryBatchRepository,
    InMemoryProjectRepository,
    InMemorySkipLedger,
    FrozenClock,
>;

/// One set of in-memory stores shared by every service in a test.
pub struct Stores {
    /// Project, dimension, and membership store.
    pub projects: Arc<InMemoryProjectRepository>,
    /// Batch store.
    pub batches: Arc<InMemoryBatchRepository>,
    /// Task store.
    pub tasks: Arc<InMemoryTaskRepository>,
    /// Annotation and value store.
    pub annotations: Arc<InMemoryAnnotationRepository>,
    /// Review and correction store.
    pub reviews: Arc<InMemoryReviewRepository>,
    /// Skip activity ledger.
    pub skips: Arc<InMemorySkipLedger>,
}

impl Stores {
    /// Builds a claim engine pinned at `clock`.
    #[must_use]
    pub fn claim_service(&self, clock: FrozenClock) -> TestClaimService {
        ClaimEngineService::new(
            Arc::clone(&self.tasks),
            Arc::clone(&self.batches),
            Arc::clone(&self.projects),
            Arc::clone(&self.skips),
            Arc::new(clock),
        )
    }

    /// Builds an annotation workflow pinned at `clock`.
    #[must_use]
    pub fn annotation_service(&self, clock: FrozenClock) -> TestAnnotationService {
        AnnotationWorkflowService::new(
            Arc::clone(&self.annotations),
            Arc::clone(&self.tasks),
            Arc::clone(&self.projects),
            Arc::new(clock),
        )
    }

    /// Builds a review engine pinned at `clock`.
    #[must_use]
    pub fn review_service(&self, clock: FrozenClock) -> TestReviewService {
        ReviewEngineService::new(
            Arc::clone(&self.reviews),
            Arc::clone(&self.annotations),
            Arc::clone(&self.tasks),
            Arc::clone(&self.batches),
            Arc::clone(&self.projects),
            Arc::clone(&self.skips),
            Arc::new(clock),
        )
    }
}

/// Provides a tokio runtime for async operations in tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
#[fixture]
pub fn runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Provides fresh in-memory stores for each test.
#[fixture]
pub fn stores() -> Stores {
    Stores {
        projects: Arc::new(InMemoryProjectRepository::new()),
        batches: Arc::new(InMemoryBatchRepository::new()),
        tasks: Arc::new(InMemoryTaskRepository::new()),
        annotations: Arc::new(InMemoryAnnotationRepository::new()),
        reviews: Arc::new(InMemoryReviewRepository::new()),
        skips: Arc::new(InMemorySkipLedger::new()),
    }
}

/// Identifiers of a fully seeded workspace.
pub struct Workspace {
    /// Active project.
    pub project_id: ProjectId,
    /// Published batch.
    pub batch_id: BatchId,
    /// Published member tasks, oldest first.
    pub task_ids: Vec<TaskId>,
    /// Categorical dimension (`clear` / `noisy`).
    pub quality: DimensionId,
    /// Numeric-scale dimension (1..=5).
    pub fluency: DimensionId,
    /// Active annotator member.
    pub annotator: UserId,
    /// Active reviewer member.
    pub reviewer: UserId,
}

/// Grants a fresh user the annotator role in `project_id`.
pub fn add_annotator(
    rt: &Runtime,
    stores: &Stores,
    clock: FrozenClock,
    project_id: ProjectId,
) -> UserId {
    let projects =
        ProjectLifecycleService::new(Arc::clone(&stores.projects), Arc::new(clock));
    let user = UserId::new();
    rt.block_on(projects.add_member(project_id, user, MemberRole::Annotator))
        .expect("annotator membership");
    user
}

/// Seeds an active project with two dimensions, an annotator, a reviewer,
/// and one published batch holding `task_count` tasks.
///
/// Everything is driven through the lifecycle services so the seeded state
/// matches what the staff-facing flows produce.
pub fn seed_workspace(
    rt: &Runtime,
    stores: &Stores,
    clock: FrozenClock,
    task_count: usize,
) -> Workspace {
    let projects =
        ProjectLifecycleService::new(Arc::clone(&stores.projects), Arc::new(clock));
    let batches = BatchLifecycleService::new(
        Arc::clone(&stores.batches),
        Arc::clone(&stores.tasks),
        Arc::new(clock),
    );

    let project = rt
        .block_on(projects.create(CreateProjectRequest::new(
            "podcast-quality-audit",
            u32::try_from(TASK_TIME_MINUTES).expect("positive minutes"),
            u32::try_from(REVIEW_TIME_MINUTES).expect("positive minutes"),
        )))
        .expect("project creation");
    let quality_schema = DimensionSchema::categorical([
        DimensionValue::new("clear").expect("valid choice"),
        DimensionValue::new("noisy").expect("valid choice"),
    ])
    .expect("valid schema");
    let quality = rt
        .block_on(projects.add_dimension(project.id(), "audio_quality", quality_schema))
        .expect("dimension creation")
        .id();
    let fluency_schema = DimensionSchema::numeric_scale(1, 5).expect("valid schema");
    let fluency = rt
        .block_on(projects.add_dimension(project.id(), "fluency", fluency_schema))
        .expect("dimension creation")
        .id();

    let annotator = UserId::new();
    let reviewer = UserId::new();
    rt.block_on(projects.add_member(project.id(), annotator, MemberRole::Annotator))
        .expect("annotator membership");
    rt.block_on(projects.add_member(project.id(), reviewer, MemberRole::Reviewer))
        .expect("reviewer membership");
    rt.block_on(projects.activate(project.id()))
        .expect("project activation");

    let batch = rt
        .block_on(batches.create(project.id(), "episode-042"))
        .expect("batch creation");
    let mut task_ids = Vec::with_capacity(task_count);
    for index in 0..task_count {
        // Tasks are staggered by a minute each so the queue's oldest-first
        // order matches the seeded order.
        let aged = BatchLifecycleService::new(
            Arc::clone(&stores.batches),
            Arc::clone(&stores.tasks),
            Arc::new(clock.advanced_by_minutes(i64::try_from(index).expect("small task count"))),
        );
        let task = rt
            .block_on(aged.add_task(batch.id(), format!("audio/episode-042/{index:03}.wav")))
            .expect("task creation");
        task_ids.push(task.id());
    }
    rt.block_on(batches.publish(batch.id())).expect("batch publish");

    Workspace {
        project_id: project.id(),
        batch_id: batch.id(),
        task_ids,
        quality,
        fluency,
        annotator,
        reviewer,
    }
}
