//! HTTP request handlers for the extraction API.

mod extraction;
mod health;
mod models_api;

pub use extraction::{extract_compare, extract_single, get_annotations, get_markdown};
pub use health::health;
pub use models_api::{get_model, list_models};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::services::ProcessorError;
use crate::storage::StorageError;
use crate::utils::ValidationError;

/// Error payload shape shared by all API endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// API error carrying the HTTP status to respond with.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            axum::Json(ErrorResponse {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

impl From<ProcessorError> for ApiError {
    fn from(e: ProcessorError) -> Self {
        match e {
            ProcessorError::Validation(_) => Self::bad_request(e.to_string()),
            ProcessorError::Backend { .. } => Self::internal(e.to_string()),
            ProcessorError::Persistence(_) => Self::internal(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => Self::not_found(e.to_string()),
            StorageError::Io(_) => Self::internal(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}
