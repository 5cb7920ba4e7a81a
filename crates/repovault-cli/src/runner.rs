use crate::config::Settings;
use anyhow::Result;
use repovault_bitbucket::BitbucketClient;
use repovault_db::Database;
use repovault_engine::{BackupEngine, GitCloner};
use repovault_notify::DiscordNotifier;
use repovault_storage::S3Store;
use std::sync::Arc;

/// One full run: back up the workspace, prune old archives, persist the
/// outcome, deliver the report. Persistence and notification failures are
/// logged but never suppress each other; the summary always reflects partial
/// results.
pub async fn execute_run(settings: &Settings) -> Result<()> {
    // a run that cannot be recorded should not start
    let db = Database::new(&settings.database_url).await?;
    db.init_schema().await?;

    let catalog = BitbucketClient::new(
        settings.client_id.clone(),
        settings.client_secret.clone(),
    );
    let store = Arc::new(
        S3Store::connect(
            settings.s3_bucket.clone(),
            settings.s3_region.clone(),
            settings.s3_endpoint.clone(),
        )
        .await,
    );
    let engine = BackupEngine::new(store, Arc::new(GitCloner), settings.pool_size);

    let outcome = engine.perform_run(&catalog, &settings.workspace).await?;

    if let Err(err) = db.record_run(&outcome.summary, &outcome.results).await {
        tracing::error!("failed to persist run summary: {}", err);
    }

    let notifier = DiscordNotifier::new(
        settings.discord_webhook_url.clone(),
        settings.dashboard_url.clone(),
    );
    if let Err(err) = notifier.send_report(&outcome.summary).await {
        tracing::error!("failed to deliver run report: {}", err);
    }

    Ok(())
}

/// Print recent run summaries, optionally with their per-repository rows.
pub async fn show_history(settings: &Settings, limit: i64, detail: bool) -> Result<()> {
    let db = Database::new(&settings.database_url).await?;

    for task in db.recent_tasks(limit).await? {
        println!(
            "#{}  {}  total {:>3}  successful {:>3}  failed {:>3}",
            task.id,
            task.started_at.format("%Y-%m-%d %H:%M:%S"),
            task.total_repos,
            task.successful,
            task.failed
        );

        if detail {
            for row in db.task_results(task.id).await? {
                println!(
                    "    {:<40} {:<8} {:>8.1}s  {}",
                    row.repo_name,
                    row.status,
                    row.duration_secs,
                    row.error_message.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
