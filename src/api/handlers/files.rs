use crate::AppState;
use crate::api::error::AppError;
use crate::models::FilePage;
use axum::{
    Json,
    extract::{Query, State},
};

use super::types::*;

#[utoipa::path(
    get,
    path = "/files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "One page of stored files, newest first", body = FilePage),
        (status = 500, description = "Storage directory could not be read", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    query: Option<Query<ListFilesQuery>>,
) -> Result<Json<FilePage>, AppError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let page = query.page();
    let limit = query.limit(state.config.page_size, state.config.max_page_size);

    let listing = state
        .listing_service
        .list_page(page, limit)
        .await
        .map_err(AppError::ListingRead)?;

    Ok(Json(listing))
}
