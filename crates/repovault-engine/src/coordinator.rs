use crate::git::Cloner;
use crate::unit::{run_unit, RunContext};
use repovault_core::{BackupTarget, RepoBackupResult};
use repovault_storage::ObjectStore;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Concurrency ceiling imposed by the object-store client.
pub const MAX_POOL_SIZE: usize = 5;

/// Clamp a configured pool size to `1..=MAX_POOL_SIZE`. An oversized request
/// is reduced with a warning, not an error.
pub fn clamp_pool_size(requested: usize) -> usize {
    if requested > MAX_POOL_SIZE {
        tracing::warn!(
            "worker pool size {} exceeds the object store concurrency ceiling, using {}",
            requested,
            MAX_POOL_SIZE
        );
        MAX_POOL_SIZE
    } else {
        requested.max(1)
    }
}

/// Fan out one pipeline invocation per target under a bounded worker budget,
/// then fan in. All targets are submitted up front; results are collected in
/// completion order, which is fine because each result carries its own
/// target identity.
///
/// Returns only after every submitted unit completed or was accounted for.
pub async fn run_all(
    targets: Vec<BackupTarget>,
    pool_size: usize,
    ctx: RunContext,
    cloner: Arc<dyn Cloner>,
    store: Arc<dyn ObjectStore>,
) -> Vec<RepoBackupResult> {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let workers = clamp_pool_size(pool_size).min(available).max(1);

    tracing::info!(
        "processing {} repositories with {} workers",
        targets.len(),
        workers
    );

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut join_set: JoinSet<RepoBackupResult> = JoinSet::new();

    for target in targets {
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        let cloner = cloner.clone();
        let store = store.clone();

        join_set.spawn(async move {
            // the semaphore is never closed while tasks hold clones of it
            let _permit = semaphore.acquire_owned().await.ok();
            run_unit(&target, &ctx, cloner.as_ref(), store.as_ref()).await
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            // a lost unit: logged here, accounted as failed by the summary
            Err(err) => tracing::error!("backup worker terminated abnormally: {}", err),
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeCloner, MemoryStore};
    use std::collections::BTreeSet;
    use std::time::Duration;

    #[test]
    fn test_pool_size_is_capped_at_five() {
        assert_eq!(clamp_pool_size(8), 5);
        assert_eq!(clamp_pool_size(5), 5);
        assert_eq!(clamp_pool_size(3), 3);
        assert_eq!(clamp_pool_size(0), 1);
    }

    #[tokio::test]
    async fn test_every_target_yields_a_result() {
        let root = tempfile::tempdir().unwrap();
        let started_at = "2024-11-20T02:00:00Z".parse().unwrap();
        let ctx = RunContext::new(started_at, root.path().to_path_buf())
            .with_retry_policy(1, Duration::from_millis(1));

        let targets: Vec<BackupTarget> = (0..6)
            .map(|i| {
                BackupTarget::from_clone_url(format!("git@bitbucket.org:acme/repo-{}.git", i))
            })
            .collect();

        let results = run_all(
            targets,
            8,
            ctx,
            Arc::new(FakeCloner::failing(0)),
            Arc::new(MemoryStore::default()),
        )
        .await;

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.is_success()));

        // completion order may differ from submission order; identity travels
        // with each result
        let names: BTreeSet<String> = results.iter().map(|r| r.name.clone()).collect();
        let expected: BTreeSet<String> = (0..6).map(|i| format!("repo-{}", i)).collect();
        assert_eq!(names, expected);
    }
}
