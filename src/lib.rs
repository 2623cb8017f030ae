pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ServerConfig;
use crate::services::listing_service::ListingService;
use crate::services::storage::StorageService;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_files,
        api::handlers::files::list_files,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::types::UploadResponse,
            api::handlers::types::UploadForm,
            api::handlers::types::ErrorResponse,
            api::handlers::health::HealthResponse,
            models::StoredFile,
            models::FileEntry,
            models::FilePage,
        )
    ),
    tags(
        (name = "files", description = "Upload and listing endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageService>,
    pub upload_service: Arc<UploadService>,
    pub listing_service: Arc<ListingService>,
    pub config: ServerConfig,
}

impl AppState {
    /// Wires the services around an already prepared storage
    pub fn new(config: ServerConfig, storage: Arc<StorageService>) -> Self {
        Self {
            upload_service: Arc::new(UploadService::from_config(storage.clone(), &config)),
            listing_service: Arc::new(ListingService::new(storage.clone())),
            storage,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let upload_dir = state.storage.root().to_path_buf();
    let public_dir = state.config.public_dir.clone();
    let index_file = public_dir.join("index.html");
    let body_limit = state.config.upload_body_limit();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::upload::upload_files)
                .layer(axum::extract::DefaultBodyLimit::max(body_limit)),
        )
        .route("/files", get(api::handlers::files::list_files))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .route_service("/", ServeFile::new(index_file))
        .fallback_service(ServeDir::new(public_dir))
        .layer(CatchPanicLayer::custom(api::error::handle_panic))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
