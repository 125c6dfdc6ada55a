//! Extraction task orchestrator.
//!
//! Owns the lifecycle of one extraction task: identity, backend resolution,
//! timed invocation, metrics, persistence, and (for comparison requests)
//! isolated fan-out across backends with deterministic aggregation.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::backends::{BackendError, BackendKind, BackendRegistry, BackendSettings};
use crate::comparison;
use crate::config::Settings;
use crate::metrics;
use crate::models::{
    ComparisonOutcome, ExtractionMetrics, ExtractionResult, ExtractionStatus, Task, TaskState,
};
use crate::storage::{ResultStore, StorageError};

/// Errors from the orchestration layer.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Malformed request: bad backend identifier, wrong backend count for a
    /// comparison, duplicate backend ids. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// One backend's extraction raised or timed out.
    #[error("Backend {backend} failed: {message}")]
    Backend {
        backend: BackendKind,
        message: String,
    },

    /// The extraction succeeded but delivery to storage failed. Surfaced
    /// distinctly so callers can tell "model failed" from "storage failed".
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
}

/// Main PDF extraction orchestrator.
///
/// Explicitly constructed with its registry and store; holds no global
/// state, so tests build one per fixture.
#[derive(Clone)]
pub struct PdfProcessor {
    registry: Arc<BackendRegistry>,
    store: Arc<ResultStore>,
    settings: Arc<Settings>,
    /// Bounds concurrently running backend invocations across all requests.
    extraction_slots: Arc<Semaphore>,
}

impl PdfProcessor {
    pub fn new(registry: BackendRegistry, store: ResultStore, settings: Settings) -> Self {
        let slots = settings.max_concurrent_extractions.max(1);
        Self {
            registry: Arc::new(registry),
            store: Arc::new(store),
            settings: Arc::new(settings),
            extraction_slots: Arc::new(Semaphore::new(slots)),
        }
    }

    /// Build a processor with adapters for the configured enabled backends.
    pub fn from_settings(settings: Settings) -> Self {
        let registry = BackendRegistry::with_enabled(
            &settings.enabled_backends,
            BackendSettings {
                max_pages: settings.max_pages,
                annotation_dpi: settings.annotation_dpi,
            },
        );
        let store = ResultStore::new(&settings.upload_dir, &settings.results_dir);
        Self::new(registry, store, settings)
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Extract with a single backend.
    ///
    /// A solitary backend failure propagates as an error rather than being
    /// downgraded into a partial success; only comparison requests have
    /// siblings to degrade into.
    pub async fn process_single(
        &self,
        file_path: &Path,
        backend: BackendKind,
        generate_annotations: bool,
    ) -> Result<ExtractionResult, ProcessorError> {
        let task_id = Uuid::new_v4().to_string();
        self.run_backend(file_path, backend, &task_id, generate_annotations)
            .await
    }

    /// Extract with 2-3 backends against the same source file and compare.
    ///
    /// Backend invocations run concurrently, bounded by the configured
    /// slot count, each under its own timeout. One backend's failure never
    /// prevents its siblings from completing. Results come back in the
    /// caller-supplied backend order, which also defines comparison
    /// tie-break precedence; the comparison is absent when fewer than two
    /// backends completed.
    pub async fn process_comparison(
        &self,
        file_path: &Path,
        backends: &[BackendKind],
        generate_annotations: bool,
    ) -> Result<ComparisonOutcome, ProcessorError> {
        self.validate_selection(backends)?;

        let parent_id = Uuid::new_v4().to_string();
        tracing::info!(
            task_id = %parent_id,
            backends = ?backends,
            "starting comparison extraction"
        );

        let mut handles = Vec::with_capacity(backends.len());
        for &backend in backends {
            let child_id = Task::child_id(&parent_id, backend);
            let processor = self.clone();
            let path = file_path.to_path_buf();

            handles.push(tokio::spawn(async move {
                match processor
                    .run_backend(&path, backend, &child_id, generate_annotations)
                    .await
                {
                    Ok(result) => result,
                    Err(e) => ExtractionResult::failed(child_id, backend, e.to_string()),
                }
            }));
        }

        // join_all yields in spawn order, which reconciles completion order
        // back to the caller-supplied backend order.
        let joined = futures::future::join_all(handles).await;
        let mut results = Vec::with_capacity(backends.len());
        for (i, outcome) in joined.into_iter().enumerate() {
            let backend = backends[i];
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(task_id = %parent_id, %backend, "extraction task panicked: {e}");
                    results.push(ExtractionResult::failed(
                        Task::child_id(&parent_id, backend),
                        backend,
                        format!("extraction task panicked: {}", e),
                    ));
                }
            }
        }

        let completed: Vec<(BackendKind, &ExtractionMetrics)> = results
            .iter()
            .filter(|r| r.is_completed())
            .filter_map(|r| r.metrics.as_ref().map(|m| (r.model, m)))
            .collect();

        let comparison = if completed.len() >= 2 {
            comparison::aggregate(&completed).ok()
        } else {
            tracing::warn!(
                task_id = %parent_id,
                completed = completed.len(),
                "too few completed results, skipping comparison"
            );
            None
        };

        Ok(ComparisonOutcome {
            task_id: parent_id,
            results,
            comparison,
        })
    }

    /// Validate a comparison backend selection.
    fn validate_selection(&self, backends: &[BackendKind]) -> Result<(), ProcessorError> {
        if backends.len() < 2 || backends.len() > 3 {
            return Err(ProcessorError::Validation(
                "Must select 2-3 backends for comparison".to_string(),
            ));
        }
        for (i, backend) in backends.iter().enumerate() {
            if backends[..i].contains(backend) {
                return Err(ProcessorError::Validation(format!(
                    "Duplicate backend: {}",
                    backend
                )));
            }
            if self.registry.get(*backend).is_none() {
                return Err(ProcessorError::Validation(format!(
                    "Backend {} is not enabled",
                    backend
                )));
            }
        }
        Ok(())
    }

    /// Run one backend invocation for one (sub-)task.
    async fn run_backend(
        &self,
        file_path: &Path,
        backend: BackendKind,
        task_id: &str,
        generate_annotations: bool,
    ) -> Result<ExtractionResult, ProcessorError> {
        let adapter = self.registry.get(backend).ok_or_else(|| {
            ProcessorError::Validation(format!("Backend {} is not enabled", backend))
        })?;
        if !adapter.is_available() {
            return Err(ProcessorError::Backend {
                backend,
                message: adapter.availability_hint(),
            });
        }

        let mut task = Task::new(
            task_id.to_string(),
            vec![backend],
            file_path.to_path_buf(),
        );

        let permit = self
            .extraction_slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ProcessorError::Backend {
                backend,
                message: "extraction executor is shut down".to_string(),
            })?;

        task.state = TaskState::Running;
        tracing::info!(task_id, %backend, "starting extraction");

        let annotations_dir = generate_annotations.then(|| self.store.annotations_dir(task_id));
        let timeout = Duration::from_secs(self.settings.backend_timeout_secs);
        let start = Instant::now();

        let outcome = tokio::time::timeout(
            timeout,
            adapter.extract(file_path, task_id, annotations_dir.as_deref()),
        )
        .await;
        let extraction_time = start.elapsed().as_secs_f64();
        drop(permit);

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                task.state = TaskState::Failed;
                tracing::error!(task_id, %backend, elapsed = extraction_time, "extraction failed: {e}");
                return Err(ProcessorError::Backend {
                    backend,
                    message: e.to_string(),
                });
            }
            Err(_) => {
                task.state = TaskState::Failed;
                tracing::error!(
                    task_id,
                    %backend,
                    elapsed = extraction_time,
                    "extraction timed out"
                );
                return Err(ProcessorError::Backend {
                    backend,
                    message: BackendError::Timeout(self.settings.backend_timeout_secs).to_string(),
                });
            }
        };

        let metrics = metrics::compute(&raw.elements, &raw.markdown_content, extraction_time);
        self.store
            .save_markdown(task_id, &raw.markdown_content)
            .await?;

        task.state = TaskState::Completed;
        tracing::info!(
            task_id,
            %backend,
            "extraction completed in {:.2}s, found {} elements",
            extraction_time,
            raw.elements.len()
        );

        let annotations_url = raw
            .annotations_generated
            .then(|| format!("/api/v1/extraction/annotations/{}", task_id));

        Ok(ExtractionResult {
            task_id: task.id,
            model: backend,
            status: ExtractionStatus::Completed,
            markdown_content: Some(raw.markdown_content),
            elements: raw.elements,
            metrics: Some(metrics),
            annotations_url,
            error: None,
        })
    }
}
