use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};

/// Longest sanitized original name kept in a stored filename, leaving room
/// for the timestamp prefix within the usual 255 byte filesystem limit.
pub const MAX_NAME_LEN: usize = 240;

/// Name used when a part carries no (or an empty) file name
pub const FALLBACK_NAME: &str = "unnamed";

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                size, max_size
            ),
        }));
    }
    Ok(())
}

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`.
///
/// Path separators are replaced like any other character, so the result can
/// never escape the storage directory.
pub fn sanitize_filename(filename: &str) -> String {
    let name = if filename.is_empty() {
        FALLBACK_NAME
    } else {
        filename
    };

    if name.contains("..") || name.contains('/') || name.contains('\\') {
        tracing::warn!("Path-like upload name neutralized: {}", name);
    }

    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.len() <= MAX_NAME_LEN {
        return sanitized;
    }

    // ASCII only from here, any byte index is a char boundary.
    // Shorten the stem so the extension survives.
    match sanitized.rfind('.') {
        Some(dot) if dot > 0 && sanitized.len() - dot < MAX_NAME_LEN => {
            let extension = sanitized.split_off(dot);
            sanitized.truncate(MAX_NAME_LEN - extension.len());
            sanitized.push_str(&extension);
        }
        _ => sanitized.truncate(MAX_NAME_LEN),
    }
    sanitized
}

/// 14 digit `YYYYMMDDHHMMSS` token in UTC
pub fn timestamp_token(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// Stored name for an upload: `<timestamp>-<sanitized name>`.
///
/// The timestamp goes first so the original extension stays the final one.
pub fn stored_filename(original: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", timestamp_token(at), sanitize_filename(original))
}

/// Whether a declared media type routes to the image normalizer
pub fn is_image_mime(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("image/")
}
