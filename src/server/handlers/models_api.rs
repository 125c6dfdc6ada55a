//! Model catalog handlers.

use axum::{extract::Path, Json};

use super::ApiError;
use crate::backends::{backend_info, catalog, BackendInfo, BackendKind};

/// List all extraction models with their capabilities.
pub async fn list_models() -> Json<Vec<BackendInfo>> {
    Json(catalog())
}

/// Get detailed information about one extraction model.
pub async fn get_model(Path(name): Path<String>) -> Result<Json<BackendInfo>, ApiError> {
    let kind = BackendKind::from_str(&name)
        .ok_or_else(|| ApiError::not_found(format!("Unknown model '{}'", name)))?;
    Ok(Json(backend_info(kind)))
}
