use crate::AppState;
use crate::api::error::AppError;
use crate::config::ServerConfig;
use crate::models::UploadedFile;
use crate::utils::validation::validate_file_size;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use bytes::BytesMut;
use chrono::Utc;
use tracing::{info, warn};

use super::types::*;

/// Form field carrying the uploaded files
pub const FILES_FIELD: &str = "files";

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Up to 10 files under the `files` field"),
    responses(
        (status = 200, description = "At least one file stored", body = UploadResponse),
        (status = 400, description = "No files, too many files, file too large or malformed body", body = ErrorResponse),
        (status = 500, description = "No file could be stored", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn upload_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Multipart(e.body_text()))?;

    let files = match read_files(&mut multipart, &state.config).await {
        Ok(files) => files,
        Err(e) => {
            // Consume the rest of the body so the client gets the error
            // instead of a connection reset
            warn!("Upload rejected early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            return Err(e);
        }
    };

    if files.is_empty() {
        return Err(AppError::NoFiles);
    }

    info!(
        "📥 Upload of {} file(s), {} bytes total",
        files.len(),
        files.iter().map(UploadedFile::size).sum::<usize>()
    );

    let outcome = state.upload_service.process_batch(files, Utc::now()).await;

    if outcome.stored.is_empty() {
        return Err(AppError::AllFilesFailed);
    }

    Ok(Json(UploadResponse {
        message: outcome.summary(),
        files: outcome.stored,
    }))
}

/// Buffers every file part of the body. Any transport or limit violation
/// rejects the whole request.
async fn read_files(
    multipart: &mut Multipart,
    config: &ServerConfig,
) -> Result<Vec<UploadedFile>, AppError> {
    let size_label = config.max_file_size_label();
    let mut files = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::from_multipart(e, &size_label))?
    {
        // Plain form values are not files
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let name = field.name().unwrap_or_default().to_string();
        if name != FILES_FIELD {
            return Err(AppError::UnexpectedField(name));
        }

        if files.len() >= config.max_files {
            return Err(AppError::TooManyFiles(config.max_files));
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::from_multipart(e, &size_label))?
        {
            if let Err(e) = validate_file_size(buffer.len() + chunk.len(), config.max_file_size) {
                warn!("Rejecting {}: {}", original_name, e);
                return Err(AppError::FileTooLarge(size_label));
            }
            buffer.extend_from_slice(&chunk);
        }

        files.push(UploadedFile::new(
            original_name,
            content_type,
            buffer.freeze(),
        ));
    }

    Ok(files)
}
