//! In-memory skip ledger for tests and embedding.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::annotation::domain::AnnotationId;
use crate::project::domain::{ProjectId, UserId};
use crate::task::{
    domain::{SkipActivity, SkipTarget, TaskId},
    ports::{SkipLedger, SkipLedgerError, SkipLedgerResult},
};

/// Thread-safe in-memory skip ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemorySkipLedger {
    entries: Arc<RwLock<Vec<SkipActivity>>>,
}

impl InMemorySkipLedger {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> SkipLedgerResult<std::sync::RwLockReadGuard<'_, Vec<SkipActivity>>> {
        self.entries
            .read()
            .map_err(|err| SkipLedgerError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> SkipLedgerResult<std::sync::RwLockWriteGuard<'_, Vec<SkipActivity>>> {
        self.entries
            .write()
            .map_err(|err| SkipLedgerError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl SkipLedger for InMemorySkipLedger {
    async fn append(&self, activity: &SkipActivity) -> SkipLedgerResult<()> {
        let mut entries = self.write()?;
        entries.push(activity.clone());
        Ok(())
    }

    async fn skipped_tasks(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> SkipLedgerResult<Vec<TaskId>> {
        let entries = self.read()?;
        Ok(entries
            .iter()
            .filter(|entry| entry.project_id() == project_id && entry.user_id() == user_id)
            .filter_map(|entry| match entry.target() {
                SkipTarget::Task(task_id) => Some(task_id),
                SkipTarget::Review(_) => None,
            })
            .collect())
    }

    async fn skipped_annotations(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> SkipLedgerResult<Vec<AnnotationId>> {
        let entries = self.read()?;
        Ok(entries
            .iter()
            .filter(|entry| entry.project_id() == project_id && entry.user_id() == user_id)
            .filter_map(|entry| match entry.target() {
                SkipTarget::Review(annotation_id) => Some(annotation_id),
                SkipTarget::Task(_) => None,
            })
            .collect())
    }
}
