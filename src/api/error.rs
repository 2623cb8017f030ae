use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::any::Any;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed multipart body
    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("File size too large. Maximum size is {0} per file.")]
    FileTooLarge(String),

    #[error("Too many files. Maximum is {0} files per request.")]
    TooManyFiles(usize),

    #[error("Unexpected field: {0}")]
    UnexpectedField(String),

    #[error("No files uploaded")]
    NoFiles,

    #[error("Failed to process any of the uploaded files")]
    AllFilesFailed,

    #[error("Error reading files")]
    ListingRead(#[source] anyhow::Error),

    /// Anything else, message exposed to the client
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Splits parser failures into the size-limit case and everything else
    pub fn from_multipart(err: MultipartError, max_file_size_label: &str) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge(max_file_size_label.to_string())
        } else {
            AppError::Multipart(err.body_text())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Multipart(_)
            | AppError::FileTooLarge(_)
            | AppError::TooManyFiles(_)
            | AppError::UnexpectedField(_)
            | AppError::NoFiles => StatusCode::BAD_REQUEST,
            AppError::AllFilesFailed | AppError::ListingRead(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Multipart(msg) => {
                tracing::warn!("Multipart error: {}", msg);
                msg.clone()
            }
            AppError::ListingRead(e) => {
                tracing::error!("Listing error: {:#}", e);
                self.to_string()
            }
            AppError::AllFilesFailed => {
                tracing::error!("{}", self);
                self.to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                msg.clone()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Response for a panicking handler, used with `CatchPanicLayer::custom`
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    AppError::Internal(message).into_response()
}
