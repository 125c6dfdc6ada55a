//! Health check handler.

use axum::{extract::State, Json};
use serde::Serialize;
use std::path::Path;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Backends whose tooling is installed and runnable right now.
    pub models_available: Vec<String>,
    pub gpu_available: bool,
}

/// Check API health and backend availability.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let models_available = state
        .processor
        .registry()
        .available_backends()
        .map(|b| b.kind().as_str().to_string())
        .collect();

    Json(HealthResponse {
        status: "healthy",
        models_available,
        gpu_available: which::which(Path::new("nvidia-smi")).is_ok(),
    })
}
