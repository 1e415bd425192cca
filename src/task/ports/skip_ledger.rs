//! Port for the append-only skip ledger.

use crate::annotation::domain::AnnotationId;
use crate::project::domain::{ProjectId, UserId};
use crate::task::domain::{SkipActivity, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for skip ledger operations.
pub type SkipLedgerResult<T> = Result<T, SkipLedgerError>;

/// Append-only record of skipped work items.
///
/// Entries are never removed; the claim and review queues consult the ledger
/// to keep skipped items away from the user who skipped them.
#[async_trait]
pub trait SkipLedger: Send + Sync {
    /// Appends a ledger entry.
    async fn append(&self, activity: &SkipActivity) -> SkipLedgerResult<()>;

    /// Returns the task identifiers `user` has skipped within a project.
    async fn skipped_tasks(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> SkipLedgerResult<Vec<TaskId>>;

    /// Returns the annotation identifiers `user` has skipped reviewing
    /// within a project.
    async fn skipped_annotations(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> SkipLedgerResult<Vec<AnnotationId>>;
}

/// Errors returned by skip ledger implementations.
#[derive(Debug, Clone, Error)]
pub enum SkipLedgerError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SkipLedgerError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
