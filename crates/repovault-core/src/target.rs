use serde::{Deserialize, Serialize};

/// One repository selected for backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupTarget {
    pub name: String,
    pub clone_url: String,
}

impl BackupTarget {
    /// Derive the short name from a clone URL: final path segment with the
    /// `.git` suffix stripped. Works for both ssh:// and scp-style URLs.
    pub fn from_clone_url(clone_url: impl Into<String>) -> Self {
        let clone_url = clone_url.into();
        let basename = clone_url.rsplit('/').next().unwrap_or(&clone_url);
        let name = basename.strip_suffix(".git").unwrap_or(basename).to_string();

        Self { name, clone_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_ssh_url() {
        let target = BackupTarget::from_clone_url("ssh://git@bitbucket.org/acme/billing-api.git");
        assert_eq!(target.name, "billing-api");
        assert_eq!(target.clone_url, "ssh://git@bitbucket.org/acme/billing-api.git");
    }

    #[test]
    fn test_name_from_scp_style_url() {
        let target = BackupTarget::from_clone_url("git@bitbucket.org:acme/thing.git");
        assert_eq!(target.name, "thing");
    }

    #[test]
    fn test_name_without_git_suffix() {
        let target = BackupTarget::from_clone_url("ssh://git@bitbucket.org/acme/plain");
        assert_eq!(target.name, "plain");
    }
}
