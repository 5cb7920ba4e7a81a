pub mod result;
pub mod retention;
pub mod retry;
pub mod target;

// Re-exports
pub use result::{BackupStatus, RepoBackupResult, RunSummary};
pub use retention::{select_for_deletion, should_delete, ArchiveEntry};
pub use retry::{retry_fixed, RETRY_ATTEMPTS, RETRY_DELAY};
pub use target::BackupTarget;
