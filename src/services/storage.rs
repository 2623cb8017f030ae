use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Size and modification time of a stored file
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub filename: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Flat directory of stored files on local disk. File identity is the name.
pub struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Creates the storage directory if it does not exist yet
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create storage dir {}", self.root.display()))
    }

    /// Writes `data` verbatim under `key`, replacing any existing file.
    /// Returns the number of bytes written.
    pub async fn upload_file(&self, key: &str, data: Bytes) -> Result<u64> {
        let path = self.path_for(key);
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(data.len() as u64)
    }

    /// Whether the storage root is a readable directory
    pub async fn is_available(&self) -> bool {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) => meta.is_dir() && tokio::fs::read_dir(&self.root).await.is_ok(),
            Err(_) => false,
        }
    }

    /// Lists every regular file directly under the root with its metadata.
    /// Sub-directories are skipped. Any read or stat failure fails the whole
    /// listing.
    pub async fn list_objects(&self) -> Result<Vec<FileMetadata>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("Failed to read storage dir {}", self.root.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry
                .metadata()
                .await
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?;

            if !meta.is_file() {
                continue;
            }

            let last_modified: DateTime<Utc> = meta.modified()?.into();
            files.push(FileMetadata {
                filename: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                last_modified,
            });
        }

        Ok(files)
    }
}
