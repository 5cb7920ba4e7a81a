use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BackupTaskRecord {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_repos: i32,
    pub successful: i32,
    pub failed: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepositoryBackupRecord {
    pub id: i64,
    pub task_id: i64,
    pub repo_name: String,
    pub repo_url: String,
    pub status: String,
    pub duration_secs: f64,
    pub error_message: Option<String>,
}
