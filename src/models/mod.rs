use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One file part of an upload request, held in memory for the request only.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(original_name: String, content_type: String, data: Bytes) -> Self {
        Self {
            original_name,
            content_type,
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A successfully stored upload as reported back to the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    /// Stored name inside the upload directory
    pub filename: String,
    /// Server relative path, `/uploads/<filename>`
    pub path: String,
    /// Absolute URL built from the configured public base URL
    pub url: String,
    /// Bytes written to disk
    pub size: u64,
    /// Media type declared by the client
    pub mimetype: String,
}

/// Listing entry for a stored file
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    /// Media type guessed from the file extension
    pub mimetype: String,
}

/// One page of the listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    pub files: Vec<FileEntry>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_files: usize,
}

impl FilePage {
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            current_page: 1,
            total_pages: 1,
            total_files: 0,
        }
    }
}
