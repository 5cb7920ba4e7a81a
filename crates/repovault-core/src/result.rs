use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupStatus {
    Success,
    Failed,
}

impl BackupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupStatus::Success => "Success",
            BackupStatus::Failed => "Failed",
        }
    }
}

/// Outcome of one repository's backup attempt. Created exactly once per
/// target, at the end of its pipeline run, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoBackupResult {
    pub name: String,
    pub url: String,
    pub status: BackupStatus,
    pub duration: Duration,
    pub error: Option<String>,
}

impl RepoBackupResult {
    pub fn success(name: String, url: String, duration: Duration) -> Self {
        Self {
            name,
            url,
            status: BackupStatus::Success,
            duration,
            error: None,
        }
    }

    pub fn failure(name: String, url: String, duration: Duration, error: String) -> Self {
        Self {
            name,
            url,
            status: BackupStatus::Failed,
            duration,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BackupStatus::Success
    }
}

/// One record per scheduled run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_repos: usize,
    pub successful: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Single authoritative reduction over the collected results.
    ///
    /// `total` is the number of dispatched targets. A unit lost to a worker
    /// fault produces no result and is accounted as failed, keeping
    /// `total == successful + failed`.
    pub fn from_results(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        total: usize,
        results: &[RepoBackupResult],
    ) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();

        Self {
            started_at,
            finished_at,
            total_repos: total,
            successful,
            failed: total.saturating_sub(successful),
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: BackupStatus) -> RepoBackupResult {
        RepoBackupResult {
            name: name.to_string(),
            url: format!("ssh://git@bitbucket.org/acme/{}.git", name),
            status,
            duration: Duration::from_secs(1),
            error: None,
        }
    }

    #[test]
    fn test_counts_add_up() {
        let results = vec![
            result("a", BackupStatus::Success),
            result("b", BackupStatus::Failed),
            result("c", BackupStatus::Failed),
        ];

        let now = Utc::now();
        let summary = RunSummary::from_results(now, now, results.len(), &results);

        assert_eq!(summary.total_repos, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.total_repos, summary.successful + summary.failed);
    }

    #[test]
    fn test_lost_units_count_as_failed() {
        // 3 targets dispatched, only 2 results came back
        let results = vec![
            result("a", BackupStatus::Success),
            result("b", BackupStatus::Success),
        ];

        let now = Utc::now();
        let summary = RunSummary::from_results(now, now, 3, &results);

        assert_eq!(summary.total_repos, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
    }
}
