//! End-to-end orchestration tests with scripted backends.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use pdfarena::backends::{
    BackendError, BackendKind, BackendRegistry, ExtractorBackend, RawExtraction,
};
use pdfarena::config::Settings;
use pdfarena::models::{DocumentElement, ElementType, ExtractionStatus};
use pdfarena::services::PdfProcessor;
use pdfarena::storage::ResultStore;

/// Scripted backend: fixed output, optional latency, optional failure.
struct ScriptedBackend {
    kind: BackendKind,
    markdown: &'static str,
    elements: Vec<DocumentElement>,
    delay: Duration,
    fail: bool,
}

impl ScriptedBackend {
    fn new(kind: BackendKind, markdown: &'static str, elements: Vec<DocumentElement>) -> Self {
        Self {
            kind,
            markdown,
            elements,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    fn failing(kind: BackendKind) -> Self {
        Self {
            kind,
            markdown: "",
            elements: Vec::new(),
            delay: Duration::ZERO,
            fail: true,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ExtractorBackend for ScriptedBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "scripted".to_string()
    }

    async fn extract(
        &self,
        _pdf_path: &Path,
        _task_id: &str,
        _annotations_dir: Option<&Path>,
    ) -> Result<RawExtraction, BackendError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(BackendError::ExtractionFailed(
                "model inference crashed".to_string(),
            ));
        }
        Ok(RawExtraction {
            markdown_content: self.markdown.to_string(),
            elements: self.elements.clone(),
            annotations_generated: false,
        })
    }
}

fn processor_with(backends: Vec<ScriptedBackend>) -> (TempDir, PdfProcessor) {
    let tmp = TempDir::new().unwrap();
    let settings = Settings::with_data_dir(tmp.path().to_path_buf());

    let mut registry = BackendRegistry::new();
    for backend in backends {
        registry.register(Box::new(backend));
    }
    let store = ResultStore::new(&settings.upload_dir, &settings.results_dir);
    (tmp, PdfProcessor::new(registry, store, settings))
}

fn elements(spec: &[(ElementType, u32)]) -> Vec<DocumentElement> {
    spec.iter()
        .map(|&(element_type, page)| DocumentElement::new(element_type, page))
        .collect()
}

#[tokio::test]
async fn comparison_ranks_completed_backends_deterministically() {
    let (_tmp, processor) = processor_with(vec![
        // Slow but element-rich.
        ScriptedBackend::new(
            BackendKind::Docling,
            "# Docling output with more text",
            elements(&[
                (ElementType::Table, 1),
                (ElementType::Text, 1),
                (ElementType::Text, 2),
                (ElementType::Figure, 3),
            ]),
        )
        .with_delay(Duration::from_millis(120)),
        // Fast but sparse.
        ScriptedBackend::new(
            BackendKind::Mineru,
            "short",
            elements(&[(ElementType::Text, 1)]),
        ),
    ]);

    let outcome = processor
        .process_comparison(
            Path::new("/tmp/paper.pdf"),
            &[BackendKind::Docling, BackendKind::Mineru],
            false,
        )
        .await
        .unwrap();

    let comparison = outcome.comparison.expect("two completed results");
    assert_eq!(comparison.fastest_model, BackendKind::Mineru);
    assert_eq!(comparison.most_elements_model, BackendKind::Docling);
    assert_eq!(comparison.longest_content_model, BackendKind::Docling);

    // Maps cover every input backend.
    assert_eq!(comparison.speed_comparison.len(), 2);
    assert_eq!(comparison.element_comparison[&BackendKind::Docling], 4);
    assert_eq!(comparison.element_comparison[&BackendKind::Mineru], 1);

    // Results stay in caller order even though mineru finished first.
    assert_eq!(outcome.results[0].model, BackendKind::Docling);
    assert_eq!(outcome.results[1].model, BackendKind::Mineru);
}

#[tokio::test]
async fn comparison_degrades_to_partial_results_without_comparison() {
    let (_tmp, processor) = processor_with(vec![
        ScriptedBackend::failing(BackendKind::Docling),
        ScriptedBackend::new(
            BackendKind::Mineru,
            "survivor",
            elements(&[(ElementType::Text, 1)]),
        ),
    ]);

    let outcome = processor
        .process_comparison(
            Path::new("/tmp/paper.pdf"),
            &[BackendKind::Docling, BackendKind::Mineru],
            false,
        )
        .await
        .unwrap();

    let failed = outcome.result_for(BackendKind::Docling).unwrap();
    let completed = outcome.result_for(BackendKind::Mineru).unwrap();

    assert_eq!(failed.status, ExtractionStatus::Failed);
    assert!(failed.error.as_deref().unwrap().contains("model inference"));
    assert!(failed.metrics.is_none());
    assert_eq!(completed.status, ExtractionStatus::Completed);
    assert!(outcome.comparison.is_none());
}

#[tokio::test]
async fn single_extraction_persists_markdown_round_trip() {
    const MARKDOWN: &str = "# Title\n\nSome *markdown* content with unicode: héllo\n";
    let (_tmp, processor) = processor_with(vec![ScriptedBackend::new(
        BackendKind::Surya,
        MARKDOWN,
        elements(&[(ElementType::Text, 1), (ElementType::Text, 2)]),
    )]);

    let result = processor
        .process_single(Path::new("/tmp/paper.pdf"), BackendKind::Surya, false)
        .await
        .unwrap();

    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(result.markdown_content.as_deref(), Some(MARKDOWN));

    let stored = processor
        .store()
        .load_markdown(&result.task_id)
        .await
        .unwrap();
    assert_eq!(stored, MARKDOWN);
}

#[tokio::test]
async fn three_way_comparison_isolates_a_single_failure() {
    let (_tmp, processor) = processor_with(vec![
        ScriptedBackend::new(
            BackendKind::Docling,
            "alpha beta",
            elements(&[(ElementType::Text, 1)]),
        ),
        ScriptedBackend::failing(BackendKind::Mineru),
        ScriptedBackend::new(
            BackendKind::Surya,
            "alpha beta gamma",
            elements(&[(ElementType::Text, 1), (ElementType::Text, 2)]),
        ),
    ]);

    let outcome = processor
        .process_comparison(
            Path::new("/tmp/paper.pdf"),
            &[BackendKind::Docling, BackendKind::Mineru, BackendKind::Surya],
            false,
        )
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 3);
    assert_eq!(
        outcome.result_for(BackendKind::Mineru).unwrap().status,
        ExtractionStatus::Failed
    );

    // Two backends completed, so the comparison ranks exactly those two.
    let comparison = outcome.comparison.expect("two completed results");
    assert_eq!(comparison.speed_comparison.len(), 2);
    assert!(!comparison
        .speed_comparison
        .contains_key(&BackendKind::Mineru));
    assert_eq!(comparison.longest_content_model, BackendKind::Surya);
    assert_eq!(comparison.most_elements_model, BackendKind::Surya);
}
