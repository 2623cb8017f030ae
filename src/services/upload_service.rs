use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::models::{StoredFile, UploadedFile};
use crate::services::image_normalizer::ImageNormalizer;
use crate::services::storage::StorageService;
use crate::utils::validation::{is_image_mime, stored_filename};

/// A file from the batch that could not be stored
#[derive(Debug)]
pub struct FileFailure {
    pub original_name: String,
    pub error: anyhow::Error,
}

/// Outcome of one upload batch. `stored` keeps request order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub requested: usize,
    pub stored: Vec<StoredFile>,
    pub failed: Vec<FileFailure>,
}

impl BatchOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Successfully processed {} of {} files",
            self.stored.len(),
            self.requested
        )
    }
}

pub struct UploadService {
    storage: Arc<StorageService>,
    normalizer: Arc<ImageNormalizer>,
    public_base_url: String,
}

impl UploadService {
    pub fn new(
        storage: Arc<StorageService>,
        normalizer: Arc<ImageNormalizer>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            normalizer,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(storage: Arc<StorageService>, config: &ServerConfig) -> Self {
        Self::new(
            storage,
            Arc::new(ImageNormalizer::from_config(config)),
            config.public_base_url.clone(),
        )
    }

    /// Stores every file of the batch concurrently. Each file runs in its own
    /// task; a failure is recorded for that file only and never cancels the
    /// others.
    pub async fn process_batch(&self, files: Vec<UploadedFile>, at: DateTime<Utc>) -> BatchOutcome {
        let requested = files.len();
        let mut join_set = JoinSet::new();
        let mut names = Vec::with_capacity(requested);

        for (index, file) in files.into_iter().enumerate() {
            names.push(file.original_name.clone());

            let storage = self.storage.clone();
            let normalizer = self.normalizer.clone();
            let base_url = self.public_base_url.clone();

            join_set.spawn(async move {
                let result = store_file(&storage, &normalizer, &base_url, file, at).await;
                (index, result)
            });
        }

        let mut stored = Vec::with_capacity(requested);
        let mut failed = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Ok(file))) => stored.push((index, file)),
                Ok((index, Err(e))) => {
                    error!("Error processing file {}: {:#}", names[index], e);
                    failed.push(FileFailure {
                        original_name: names[index].clone(),
                        error: e,
                    });
                }
                Err(e) => {
                    // Panicked task, the file it carried is unknown here
                    error!("Upload task panicked: {}", e);
                    failed.push(FileFailure {
                        original_name: String::new(),
                        error: anyhow!("Upload task failed: {}", e),
                    });
                }
            }
        }

        stored.sort_by_key(|(index, _)| *index);
        let outcome = BatchOutcome {
            requested,
            stored: stored.into_iter().map(|(_, file)| file).collect(),
            failed,
        };

        info!("📦 {}", outcome.summary());
        outcome
    }
}

async fn store_file(
    storage: &StorageService,
    normalizer: &ImageNormalizer,
    base_url: &str,
    file: UploadedFile,
    at: DateTime<Utc>,
) -> Result<StoredFile> {
    let filename = stored_filename(&file.original_name, at);

    let size = if is_image_mime(&file.content_type) {
        normalizer
            .compress_to_file(file.data, &storage.path_for(&filename))
            .await?
    } else {
        storage.upload_file(&filename, file.data).await?
    };

    let path = format!("/uploads/{}", filename);
    Ok(StoredFile {
        url: format!("{}{}", base_url, path),
        filename,
        path,
        size,
        mimetype: file.content_type,
    })
}
