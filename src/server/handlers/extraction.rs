//! Extraction API handlers.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use crate::backends::BackendKind;
use crate::models::{ComparisonSummary, ExtractionResult};
use crate::server::AppState;
use crate::storage::ResultStore;
use crate::utils::validate_pdf;

/// Response for comparison requests: per-model results plus rankings over
/// the completed subset (absent when fewer than two completed).
#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub task_id: String,
    pub results: HashMap<String, ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonSummary>,
}

/// Parsed multipart upload form.
struct UploadForm {
    filename: String,
    content: Vec<u8>,
    model: Option<String>,
    models: Option<String>,
    generate_annotations: Option<bool>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self {
            filename: String::new(),
            content: Vec::new(),
            model: None,
            models: None,
            generate_annotations: None,
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    form.filename = field.file_name().unwrap_or_default().to_string();
                    form.content = field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ApiError::bad_request(format!("Failed to read upload: {}", e))
                        })?
                        .to_vec();
                }
                "model" => form.model = Some(read_text(field).await?),
                "models" => form.models = Some(read_text(field).await?),
                "generate_annotations" => {
                    let value = read_text(field).await?;
                    form.generate_annotations =
                        Some(value.eq_ignore_ascii_case("true") || value == "1");
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed form field: {}", e)))
}

/// Save a validated upload under a fresh upload id.
///
/// Uploads are keyed separately from task ids; the orchestrator assigns
/// task identity itself.
async fn stage_upload(
    store: &ResultStore,
    form: &UploadForm,
) -> Result<(String, std::path::PathBuf), ApiError> {
    let upload_id = Uuid::new_v4().to_string();
    let path = store
        .save_upload(&upload_id, &form.filename, &form.content)
        .await?;
    Ok((upload_id, path))
}

/// Extract content from a PDF using a single model.
pub async fn extract_single(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractionResult>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    validate_pdf(&form.filename, &form.content, state.settings.max_file_size)?;

    let model = form
        .model
        .as_deref()
        .and_then(BackendKind::from_str)
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "Unknown model '{}'",
                form.model.as_deref().unwrap_or("")
            ))
        })?;
    let annotate = form
        .generate_annotations
        .unwrap_or(state.settings.default_annotations);

    let (upload_id, file_path) = stage_upload(state.processor.store(), &form).await?;
    tracing::info!(filename = %form.filename, %model, "processing upload");

    let outcome = state
        .processor
        .process_single(&file_path, model, annotate)
        .await;

    // The upload is transient; results persist under the task id.
    let _ = state.processor.store().cleanup_upload(&upload_id).await;

    Ok(Json(outcome?))
}

/// Extract content from a PDF using multiple models for comparison.
pub async fn extract_compare(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ComparisonResponse>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    validate_pdf(&form.filename, &form.content, state.settings.max_file_size)?;

    let models_field = form.models.as_deref().unwrap_or_default();
    let mut models = Vec::new();
    for name in models_field.split(',').map(|s| s.trim()) {
        let model = BackendKind::from_str(name)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown model '{}'", name)))?;
        models.push(model);
    }

    let annotate = form
        .generate_annotations
        .unwrap_or(state.settings.default_annotations);

    let (upload_id, file_path) = stage_upload(state.processor.store(), &form).await?;
    tracing::info!(filename = %form.filename, models = ?models, "processing comparison upload");

    let outcome = state
        .processor
        .process_comparison(&file_path, &models, annotate)
        .await;

    let _ = state.processor.store().cleanup_upload(&upload_id).await;
    let outcome = outcome?;

    let results = outcome
        .results
        .into_iter()
        .map(|r| (r.model.as_str().to_string(), r))
        .collect();

    Ok(Json(ComparisonResponse {
        task_id: outcome.task_id,
        results,
        comparison: outcome.comparison,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnnotationsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

/// Get the annotated image for one page of a task.
pub async fn get_annotations(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<AnnotationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state
        .processor
        .store()
        .load_annotation(&task_id, query.page)
        .await
        .map_err(|_| ApiError::not_found("Annotations not found for this task/page"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"annotated_page_{}.png\"", query.page),
            ),
        ],
        bytes,
    ))
}

/// Download the extracted markdown content for a task.
pub async fn get_markdown(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let content = state
        .processor
        .store()
        .load_markdown(&task_id)
        .await
        .map_err(|_| ApiError::not_found("Markdown file not found for this task"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"extracted_content.md\"".to_string(),
            ),
        ],
        content,
    ))
}
