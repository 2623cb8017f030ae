use anyhow::Result;
use std::sync::Arc;

use crate::models::{FileEntry, FilePage};
use crate::services::storage::{FileMetadata, StorageService};

pub struct ListingService {
    storage: Arc<StorageService>,
}

impl ListingService {
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self { storage }
    }

    /// Reads the storage directory and returns the requested page, newest
    /// first. `page` is clamped into range, `limit` must be at least 1.
    pub async fn list_page(&self, page: usize, limit: usize) -> Result<FilePage> {
        let objects = self.storage.list_objects().await?;
        Ok(paginate(objects, page, limit))
    }
}

/// Media type hint from the file extension
pub fn mimetype_hint(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

/// Sorts by modification time descending (ties by name ascending) and cuts
/// out one page.
pub fn paginate(mut objects: Vec<FileMetadata>, page: usize, limit: usize) -> FilePage {
    if objects.is_empty() {
        return FilePage::empty();
    }

    objects.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    let limit = limit.max(1);
    let total_files = objects.len();
    let total_pages = total_files.div_ceil(limit);
    let current_page = page.clamp(1, total_pages);

    let files = objects
        .into_iter()
        .skip((current_page - 1) * limit)
        .take(limit)
        .map(|meta| FileEntry {
            url: format!("/uploads/{}", meta.filename),
            mimetype: mimetype_hint(&meta.filename),
            size: meta.size,
            upload_date: meta.last_modified,
            filename: meta.filename,
        })
        .collect();

    FilePage {
        files,
        current_page,
        total_pages,
        total_files,
    }
}
