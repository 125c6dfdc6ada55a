//! Router configuration for the extraction API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    // Leave headroom for multipart framing on top of the file itself.
    let body_limit = state.settings.max_file_size as usize + 64 * 1024;

    Router::new()
        // Health check for container orchestration
        .route("/health", get(handlers::health))
        // Model catalog (read-only)
        .route("/api/v1/models", get(handlers::list_models))
        .route("/api/v1/models/:name", get(handlers::get_model))
        // Extraction API
        .route("/api/v1/extraction/single", post(handlers::extract_single))
        .route("/api/v1/extraction/compare", post(handlers::extract_compare))
        .route(
            "/api/v1/extraction/annotations/:task_id",
            get(handlers::get_annotations),
        )
        .route(
            "/api/v1/extraction/markdown/:task_id",
            get(handlers::get_markdown),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
