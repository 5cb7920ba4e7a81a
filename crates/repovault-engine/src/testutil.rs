//! Fakes shared by the engine tests: a scriptable cloner and an in-memory
//! object store.

use crate::git::Cloner;
use anyhow::{bail, Result};
use async_trait::async_trait;
use repovault_storage::{self as storage, ObjectStore};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Cloner that fails a fixed number of leading attempts (per instance, over
/// all URLs), then writes a minimal bare-repo layout.
pub struct FakeCloner {
    failures: u32,
    attempts: AtomicU32,
    fail_urls_containing: Vec<String>,
}

impl FakeCloner {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            attempts: AtomicU32::new(0),
            fail_urls_containing: Vec::new(),
        }
    }

    /// Always fail for URLs containing any of the given fragments.
    pub fn with_broken_urls(mut self, fragments: &[&str]) -> Self {
        self.fail_urls_containing = fragments.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cloner for FakeCloner {
    async fn mirror_clone(&self, url: &str, dest: &Path) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if self
            .fail_urls_containing
            .iter()
            .any(|fragment| url.contains(fragment))
        {
            bail!("fatal: could not read from remote repository {}", url);
        }
        if attempt <= self.failures {
            bail!(
                "fatal: early EOF from {} (attempt {})",
                url,
                attempt
            );
        }

        std::fs::create_dir_all(dest)?;
        std::fs::write(dest.join("HEAD"), "ref: refs/heads/main\n")?;
        Ok(())
    }
}

/// Cloner that reports success without creating the destination, so the
/// packaging step fails.
pub struct VanishingCloner;

#[async_trait]
impl Cloner for VanishingCloner {
    async fn mirror_clone(&self, _url: &str, _dest: &Path) -> Result<()> {
        Ok(())
    }
}

/// In-memory object store.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    upload_attempts: AtomicU32,
    fail_upload_containing: Option<String>,
    fail_delete_containing: Option<String>,
}

impl MemoryStore {
    /// Uploads whose key contains `fragment` always fail.
    pub fn with_upload_outage(mut self, fragment: &str) -> Self {
        self.fail_upload_containing = Some(fragment.to_string());
        self
    }

    /// Deletes whose key contains `fragment` always fail.
    pub fn with_delete_outage(mut self, fragment: &str) -> Self {
        self.fail_delete_containing = Some(fragment.to_string());
        self
    }

    pub fn seed(&self, key: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Vec::new());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn upload_attempts(&self) -> u32 {
        self.upload_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> storage::Result<()> {
        self.upload_attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(fragment) = &self.fail_upload_containing {
            if key.contains(fragment.as_str()) {
                return Err(storage::Error::Upload(format!(
                    "simulated upload outage for {}",
                    key
                )));
            }
        }

        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn list_all(&self) -> storage::Result<Vec<String>> {
        Ok(self.keys())
    }

    async fn delete(&self, key: &str) -> storage::Result<()> {
        if let Some(fragment) = &self.fail_delete_containing {
            if key.contains(fragment.as_str()) {
                return Err(storage::Error::Delete(format!(
                    "simulated delete outage for {}",
                    key
                )));
            }
        }

        self.objects.lock().unwrap().remove(key);
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}
