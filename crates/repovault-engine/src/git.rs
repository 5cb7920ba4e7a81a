use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Mirror-clone operation, abstracted so the pipeline can be exercised
/// without a reachable git remote.
#[async_trait]
pub trait Cloner: Send + Sync {
    /// Full bare copy of `url` including all refs, written to `dest`.
    async fn mirror_clone(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Shells out to `git clone --mirror`; success is a zero exit code.
pub struct GitCloner;

#[async_trait]
impl Cloner for GitCloner {
    async fn mirror_clone(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("cloning {}...", url);

        let output = Command::new("git")
            .arg("clone")
            .arg("--mirror")
            .arg(url)
            .arg(dest)
            .output()
            .await
            .context("failed to spawn git")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git clone --mirror {} failed: {}", url, stderr.trim());
        }

        Ok(())
    }
}
