use crate::coordinator::run_all;
use crate::git::Cloner;
use crate::unit::RunContext;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use repovault_bitbucket::BitbucketClient;
use repovault_core::{
    select_for_deletion, ArchiveEntry, BackupTarget, RepoBackupResult, RunSummary, RETRY_ATTEMPTS,
    RETRY_DELAY,
};
use repovault_storage::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Everything persistence and notification need from one run.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub results: Vec<RepoBackupResult>,
}

/// Orchestrates one run: discover targets, back each up under the worker
/// budget, aggregate the outcomes, then prune expired archives.
pub struct BackupEngine {
    store: Arc<dyn ObjectStore>,
    cloner: Arc<dyn Cloner>,
    pool_size: usize,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl BackupEngine {
    pub fn new(store: Arc<dyn ObjectStore>, cloner: Arc<dyn Cloner>, pool_size: usize) -> Self {
        Self {
            store,
            cloner,
            pool_size,
            retry_attempts: RETRY_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    /// One full scheduled run. A catalog failure aborts before any unit
    /// starts; a retention failure never affects the returned outcome.
    pub async fn perform_run(
        &self,
        catalog: &BitbucketClient,
        workspace: &str,
    ) -> Result<RunOutcome> {
        let started_at = Utc::now();

        let targets = catalog.list_targets(workspace).await?;
        let outcome = self.backup_all(started_at, targets).await?;

        self.prune(started_at.date_naive()).await;

        Ok(outcome)
    }

    /// Back up the given targets and reduce the results into a summary.
    pub async fn backup_all(
        &self,
        started_at: DateTime<Utc>,
        targets: Vec<BackupTarget>,
    ) -> Result<RunOutcome> {
        let total = targets.len();

        let work_root = TempDir::with_prefix("repovault_")?;
        let ctx = RunContext::new(started_at, work_root.path().to_path_buf())
            .with_retry_policy(self.retry_attempts, self.retry_delay);

        let results = run_all(
            targets,
            self.pool_size,
            ctx,
            self.cloner.clone(),
            self.store.clone(),
        )
        .await;

        // individual units already released their own files; this drops the
        // shared working root itself
        drop(work_root);

        let finished_at = Utc::now();
        let summary = RunSummary::from_results(started_at, finished_at, total, &results);

        tracing::info!(
            "run finished: {} total, {} successful, {} failed",
            summary.total_repos,
            summary.successful,
            summary.failed
        );

        Ok(RunOutcome { summary, results })
    }

    /// Retention pass against the store inventory, independent of the backup
    /// phase. A listing failure aborts only this pass; a failed delete is
    /// logged and skipped.
    pub async fn prune(&self, today: NaiveDate) {
        let keys = match self.store.list_all().await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::error!(
                    "could not list existing archives, skipping retention pass: {}",
                    err
                );
                return;
            }
        };

        let entries: Vec<ArchiveEntry> = keys.into_iter().map(ArchiveEntry::parse).collect();
        let expired = select_for_deletion(&entries, today);

        tracing::info!(
            "retention: {} of {} archives eligible for deletion",
            expired.len(),
            entries.len()
        );

        for entry in expired {
            tracing::info!("deleting expired archive {}", entry.key);
            if let Err(err) = self.store.delete(&entry.key).await {
                tracing::error!("failed to delete {}, skipping: {}", entry.key, err);
            }
        }
    }
}
