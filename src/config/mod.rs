use std::env;
use std::path::PathBuf;

/// Runtime configuration for the upload server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port (default: 3030)
    pub port: u16,

    /// Base URL prepended to `/uploads/<name>` in upload responses
    /// (default: "http://localhost:3030")
    pub public_base_url: String,

    /// Directory holding stored files (default: "uploads")
    pub upload_dir: PathBuf,

    /// Directory holding the front-end assets (default: "public")
    pub public_dir: PathBuf,

    /// Maximum size of a single uploaded file in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Maximum number of file parts per upload request (default: 10)
    pub max_files: usize,

    /// Default listing page size (default: 20)
    pub page_size: usize,

    /// Upper bound for a client supplied `limit` (default: 100)
    pub max_page_size: usize,

    /// Bounding box for normalized images (default: 1920x1080)
    pub image_max_width: u32,
    pub image_max_height: u32,

    /// JPEG quality for normalized images, 1-100 (default: 80)
    pub image_quality: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            public_base_url: "http://localhost:3030".to_string(),
            upload_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            max_file_size: 50 * 1024 * 1024, // 50 MB
            max_files: 10,
            page_size: 20,
            max_page_size: 100,
            image_max_width: 1920,
            image_max_height: 1080,
            image_quality: 80,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .or_else(|_| env::var("HOST"))
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.public_base_url),

            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            public_dir: env::var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.public_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.max_file_size),

            max_files: env::var("MAX_FILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.max_files),

            page_size: env::var("PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.page_size),

            max_page_size: env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.max_page_size),

            image_max_width: env::var("IMAGE_MAX_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.image_max_width),

            image_max_height: env::var("IMAGE_MAX_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.image_max_height),

            image_quality: env::var("IMAGE_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| (1..=100).contains(v))
                .unwrap_or(default.image_quality),
        }
    }

    /// Config rooted at a scratch directory, used by tests and local tooling
    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..Self::default()
        }
    }

    /// Body limit for the upload route: every allowed part at full size plus
    /// 10 MB of multipart framing.
    pub fn upload_body_limit(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_size)
            .saturating_add(10 * 1024 * 1024)
    }

    /// Human readable per-file cap, e.g. "50MB"
    pub fn max_file_size_label(&self) -> String {
        let mb = self.max_file_size / 1024 / 1024;
        if mb > 0 && mb * 1024 * 1024 == self.max_file_size {
            format!("{}MB", mb)
        } else {
            format!("{} bytes", self.max_file_size)
        }
    }
}
