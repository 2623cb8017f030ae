use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::StoredFile;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<StoredFile>,
}

/// OpenAPI shape of the upload form
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<Vec<u8>>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Raw pagination parameters. Parsed leniently: anything that is not a
/// positive integer falls back to the default.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFilesQuery {
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Page size
    pub limit: Option<String>,
}

impl ListFilesQuery {
    pub fn page(&self) -> usize {
        parse_positive(self.page.as_deref()).unwrap_or(1)
    }

    pub fn limit(&self, default: usize, max: usize) -> usize {
        parse_positive(self.limit.as_deref())
            .unwrap_or(default)
            .min(max)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}
