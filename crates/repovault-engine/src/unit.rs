use crate::archive::zip_directory;
use crate::git::Cloner;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use repovault_core::{retry_fixed, BackupTarget, RepoBackupResult, RETRY_ATTEMPTS, RETRY_DELAY};
use repovault_storage::ObjectStore;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// State shared by every unit of one run: the run-wide timestamp (so all
/// archives from one run carry comparable names) and the working root. Each
/// unit gets its own subdirectory of the root; no two units write the same
/// path.
#[derive(Clone)]
pub struct RunContext {
    date_str: String,
    time_str: String,
    key_prefix: String,
    work_root: PathBuf,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl RunContext {
    pub fn new(started_at: DateTime<Utc>, work_root: PathBuf) -> Self {
        Self {
            date_str: started_at.format("%Y-%m-%d").to_string(),
            time_str: started_at.format("%H-%M-%S").to_string(),
            key_prefix: started_at.format("%Y/%m/%d").to_string(),
            work_root,
            retry_attempts: RETRY_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    fn zip_name(&self, target: &BackupTarget) -> String {
        format!("{}_{}_{}.zip", target.name, self.date_str, self.time_str)
    }
}

/// Process one target: clone, package, upload, cleanup.
///
/// Never fails outward. Every error is converted into a `Failed` result so
/// one broken repository cannot abort the run.
pub async fn run_unit(
    target: &BackupTarget,
    ctx: &RunContext,
    cloner: &dyn Cloner,
    store: &dyn ObjectStore,
) -> RepoBackupResult {
    let started = Instant::now();

    let repo_dir = ctx.work_root.join(&target.name);
    let zip_name = ctx.zip_name(target);
    let zip_path = ctx.work_root.join(&zip_name);
    let object_key = format!("{}/{}", ctx.key_prefix, zip_name);

    let outcome = backup_steps(target, ctx, cloner, store, &repo_dir, &zip_path, &object_key).await;

    // clone dir and local archive go away on every exit path, even when
    // packaging or upload never ran
    cleanup(&repo_dir, &zip_path).await;

    let duration = started.elapsed();
    match outcome {
        Ok(()) => {
            tracing::info!("repository {} processed successfully", target.name);
            RepoBackupResult::success(target.name.clone(), target.clone_url.clone(), duration)
        }
        Err(err) => {
            tracing::error!("failed to process {}: {:#}", target.clone_url, err);
            RepoBackupResult::failure(
                target.name.clone(),
                target.clone_url.clone(),
                duration,
                format!("{:#}", err),
            )
        }
    }
}

async fn backup_steps(
    target: &BackupTarget,
    ctx: &RunContext,
    cloner: &dyn Cloner,
    store: &dyn ObjectStore,
    repo_dir: &Path,
    zip_path: &Path,
    object_key: &str,
) -> Result<()> {
    retry_fixed("clone", ctx.retry_attempts, ctx.retry_delay, || {
        cloner.mirror_clone(&target.clone_url, repo_dir)
    })
    .await?;

    // local I/O, assumed reliable: not retried
    tracing::info!("packaging {}...", target.name);
    let source = repo_dir.to_path_buf();
    let dest = zip_path.to_path_buf();
    tokio::task::spawn_blocking(move || zip_directory(&source, &dest))
        .await
        .context("packaging task aborted")??;

    tracing::info!("uploading {}...", object_key);
    retry_fixed("upload", ctx.retry_attempts, ctx.retry_delay, || async {
        let bytes = tokio::fs::read(zip_path)
            .await
            .with_context(|| format!("failed to read {}", zip_path.display()))?;
        store.upload(object_key, bytes).await?;
        Ok::<(), anyhow::Error>(())
    })
    .await?;

    Ok(())
}

async fn cleanup(repo_dir: &Path, zip_path: &Path) {
    if let Err(err) = tokio::fs::remove_dir_all(repo_dir).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove {}: {}", repo_dir.display(), err);
        }
    }
    if let Err(err) = tokio::fs::remove_file(zip_path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove {}: {}", zip_path.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeCloner, MemoryStore, VanishingCloner};
    use repovault_core::BackupStatus;
    use tempfile::tempdir;

    fn context(work_root: PathBuf) -> RunContext {
        let started_at = "2024-11-20T02:00:00Z".parse().unwrap();
        RunContext::new(started_at, work_root).with_retry_policy(3, Duration::from_millis(1))
    }

    fn target() -> BackupTarget {
        BackupTarget::from_clone_url("git@bitbucket.org:acme/billing.git")
    }

    #[tokio::test]
    async fn test_clone_recovers_within_retry_budget() {
        let root = tempdir().unwrap();
        let ctx = context(root.path().to_path_buf());
        let cloner = FakeCloner::failing(2);
        let store = MemoryStore::default();

        let result = run_unit(&target(), &ctx, &cloner, &store).await;

        assert_eq!(result.status, BackupStatus::Success);
        assert_eq!(cloner.attempts(), 3);

        // run-wide timestamp flows into the object key
        let keys = store.keys();
        assert_eq!(keys, vec!["2024/11/20/billing_2024-11-20_02-00-00.zip"]);

        // working area released
        assert!(!root.path().join("billing").exists());
        assert!(!root
            .path()
            .join("billing_2024-11-20_02-00-00.zip")
            .exists());
    }

    #[tokio::test]
    async fn test_clone_exhaustion_surfaces_last_error() {
        let root = tempdir().unwrap();
        let ctx = context(root.path().to_path_buf());
        let cloner = FakeCloner::failing(u32::MAX);
        let store = MemoryStore::default();

        let result = run_unit(&target(), &ctx, &cloner, &store).await;

        assert_eq!(result.status, BackupStatus::Failed);
        assert_eq!(cloner.attempts(), 3);
        // the third attempt's error text, not a retries-exhausted wrapper
        let error = result.error.unwrap();
        assert!(error.contains("attempt 3"), "unexpected error: {}", error);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_package_failure_still_cleans_up() {
        let root = tempdir().unwrap();
        let ctx = context(root.path().to_path_buf());
        // clone "succeeds" but leaves no directory behind, so packaging fails
        let cloner = VanishingCloner;
        let store = MemoryStore::default();

        let result = run_unit(&target(), &ctx, &cloner, &store).await;

        assert_eq!(result.status, BackupStatus::Failed);
        // upload never ran
        assert!(store.keys().is_empty());
        // the partially written archive is removed anyway
        assert!(!root
            .path()
            .join("billing_2024-11-20_02-00-00.zip")
            .exists());
        assert!(!root.path().join("billing").exists());
    }

    #[tokio::test]
    async fn test_upload_exhaustion_fails_the_unit() {
        let root = tempdir().unwrap();
        let ctx = context(root.path().to_path_buf());
        let cloner = FakeCloner::failing(0);
        let store = MemoryStore::default().with_upload_outage("billing");

        let result = run_unit(&target(), &ctx, &cloner, &store).await;

        assert_eq!(result.status, BackupStatus::Failed);
        assert!(result.error.unwrap().contains("simulated upload outage"));
        assert_eq!(store.upload_attempts(), 3);
        assert!(!root.path().join("billing").exists());
    }
}
