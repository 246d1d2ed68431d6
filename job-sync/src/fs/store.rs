//! Local backup directory: one sub-directory per job, each holding the
//! job's `config.xml` verbatim.
//!
//! ```text
//! pipeline/
//!   build/config.xml
//!   deploy/config.xml
//! ```

use crate::utils::{Result, SyncError};
use bytes::Bytes;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "config.xml";

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn job_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn config_path(&self, name: &str) -> PathBuf {
        self.job_dir(name).join(CONFIG_FILE_NAME)
    }

    /// Names of the immediate sub-directories of the backup root.
    ///
    /// Job names are assumed to contain no `.`; directories that do are
    /// skipped and reported at `warn` level. Plain files are ignored.
    pub async fn list_job_directories(&self) -> Result<BTreeSet<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| SyncError::from_io(&self.root, e))?;
        let mut names = BTreeSet::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!("Skipping directory with non UTF-8 name: {}", entry.path().display());
                continue;
            };

            if name.contains('.') {
                warn!("Skipping directory {}: job names must not contain '.'", entry.path().display());
                continue;
            }

            names.insert(name.to_string());
        }

        debug!("Found {} job directories in {}", names.len(), self.root.display());
        Ok(names)
    }

    pub async fn read_config(&self, name: &str) -> Result<Bytes> {
        check_job_name(name)?;
        let path = self.config_path(name);
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|e| SyncError::from_io(&path, e))?;
        Ok(Bytes::from(contents))
    }

    /// Write a job's configuration, creating the job directory (and the
    /// backup root) when missing.
    pub async fn write_config(&self, name: &str, body: &[u8]) -> Result<PathBuf> {
        check_job_name(name)?;
        tokio::fs::create_dir_all(self.job_dir(name)).await?;

        let path = self.config_path(name);
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }
}

/// A job name must map to exactly one directory directly under the root.
pub(crate) fn check_job_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(SyncError::InvalidJobName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_skips_files_and_dotted_names() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir(temp_dir.path().join("build"))?;
        fs::create_dir(temp_dir.path().join("deploy"))?;
        fs::create_dir(temp_dir.path().join("release.old"))?;
        fs::create_dir(temp_dir.path().join(".git"))?;
        fs::write(temp_dir.path().join("README"), b"not a job")?;

        let store = LocalStore::new(temp_dir.path());
        let names = store.list_job_directories().await?;

        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["build", "deploy"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_empty_root() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = LocalStore::new(temp_dir.path());
        assert!(store.list_job_directories().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_missing_root_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().join("missing"));
        let result = store.list_job_directories().await;
        assert!(matches!(result, Err(SyncError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_write_creates_directories() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = LocalStore::new(temp_dir.path().join("pipeline"));

        let path = store.write_config("build", b"<project/>").await?;

        assert_eq!(path, temp_dir.path().join("pipeline/build/config.xml"));
        assert_eq!(fs::read(&path)?, b"<project/>");
        assert_eq!(store.read_config("build").await?, Bytes::from_static(b"<project/>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_overwrites_existing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = LocalStore::new(temp_dir.path());

        store.write_config("build", b"<old/>").await?;
        store.write_config("build", b"<new/>").await?;

        assert_eq!(store.read_config("build").await?, Bytes::from_static(b"<new/>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_names_escaping_root() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().join("pipeline"));

        for name in ["", "..", "../outside", "nested/job"] {
            let result = store.write_config(name, b"<project/>").await;
            assert!(matches!(result, Err(SyncError::InvalidJobName(_))), "{:?}", name);
        }
        assert!(!temp_dir.path().join("outside").exists());
    }

    #[tokio::test]
    async fn test_read_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("empty-job")).unwrap();
        let store = LocalStore::new(temp_dir.path());

        match store.read_config("empty-job").await {
            Err(SyncError::NotFound(path)) => {
                assert_eq!(path, temp_dir.path().join("empty-job/config.xml"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
