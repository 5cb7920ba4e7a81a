use crate::models::{BackupTaskRecord, RepositoryBackupRecord};
use crate::Result;
use repovault_core::{RepoBackupResult, RunSummary};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Create new database connection
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS backup_tasks (
                id BIGSERIAL PRIMARY KEY,
                started_at TIMESTAMPTZ NOT NULL,
                finished_at TIMESTAMPTZ NOT NULL,
                total_repos INTEGER NOT NULL,
                successful INTEGER NOT NULL,
                failed INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS repository_backups (
                id BIGSERIAL PRIMARY KEY,
                task_id BIGINT NOT NULL REFERENCES backup_tasks(id),
                repo_name VARCHAR(255) NOT NULL,
                repo_url VARCHAR(500) NOT NULL,
                status VARCHAR(50) NOT NULL,
                duration_secs DOUBLE PRECISION NOT NULL,
                error_message TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_repository_backups_task_id ON repository_backups(task_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist one run: the task summary plus one row per repository, in a
    /// single transaction. Returns the new task id.
    pub async fn record_run(
        &self,
        summary: &RunSummary,
        results: &[RepoBackupResult],
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let (task_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO backup_tasks (started_at, finished_at, total_repos, successful, failed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(summary.started_at)
        .bind(summary.finished_at)
        .bind(summary.total_repos as i32)
        .bind(summary.successful as i32)
        .bind(summary.failed as i32)
        .fetch_one(&mut *tx)
        .await?;

        for result in results {
            sqlx::query(
                r#"
                INSERT INTO repository_backups
                    (task_id, repo_name, repo_url, status, duration_secs, error_message)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(task_id)
            .bind(&result.name)
            .bind(&result.url)
            .bind(result.status.as_str())
            .bind(result.duration.as_secs_f64())
            .bind(result.error.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!("recorded run as task {}", task_id);

        Ok(task_id)
    }

    /// Most recent run summaries, newest first.
    pub async fn recent_tasks(&self, limit: i64) -> Result<Vec<BackupTaskRecord>> {
        let records = sqlx::query_as::<_, BackupTaskRecord>(
            "SELECT * FROM backup_tasks ORDER BY started_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Per-repository rows of one task.
    pub async fn task_results(&self, task_id: i64) -> Result<Vec<RepositoryBackupRecord>> {
        let records = sqlx::query_as::<_, RepositoryBackupRecord>(
            "SELECT * FROM repository_backups WHERE task_id = $1 ORDER BY repo_name",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
