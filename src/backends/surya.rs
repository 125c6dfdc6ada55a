//! Surya extraction backend.
//!
//! Surya's layout models are driven through its Python pipeline; this
//! adapter currently uses the pipeline's fallback path: per-page text
//! extraction via Poppler `pdftotext`, one text block per non-empty page.
//! That keeps the backend fast, multilingual-safe, and dependency-light at
//! the cost of layout fidelity.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use super::backend::{
    check_binary, BackendError, BackendKind, BackendSettings, ExtractorBackend, RawExtraction,
};
use super::pdf_utils::{pdf_page_count, render_annotation_pages};
use crate::models::{DocumentElement, ElementType};

const PDFTOTEXT_HINT: &str = "pdftotext not installed. Install with: apt install poppler-utils";

/// Surya backend with Poppler fallback extraction.
pub struct SuryaBackend {
    settings: BackendSettings,
}

impl SuryaBackend {
    pub fn new() -> Self {
        Self {
            settings: BackendSettings::default(),
        }
    }

    pub fn with_settings(settings: BackendSettings) -> Self {
        Self { settings }
    }

    /// Extract text for a single page.
    async fn page_text(&self, pdf_path: &Path, page: u32) -> Result<String, BackendError> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-layout", "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg("-")
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(BackendError::ExtractionFailed(format!(
                    "pdftotext failed on page {}: {}",
                    page, stderr
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BackendError::NotAvailable(PDFTOTEXT_HINT.to_string()))
            }
            Err(e) => Err(BackendError::Io(e)),
        }
    }
}

impl Default for SuryaBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractorBackend for SuryaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Surya
    }

    fn is_available(&self) -> bool {
        check_binary(Path::new("pdftotext"))
    }

    fn availability_hint(&self) -> String {
        if !check_binary(Path::new("pdftotext")) {
            PDFTOTEXT_HINT.to_string()
        } else {
            "Surya fallback extraction is available".to_string()
        }
    }

    async fn extract(
        &self,
        pdf_path: &Path,
        task_id: &str,
        annotations_dir: Option<&Path>,
    ) -> Result<RawExtraction, BackendError> {
        let pages = pdf_page_count(pdf_path).await?;
        if pages > self.settings.max_pages {
            return Err(BackendError::UnsupportedPageCount {
                pages,
                max: self.settings.max_pages,
            });
        }

        let mut markdown_sections = Vec::new();
        let mut elements = Vec::new();

        for page in 1..=pages {
            let text = self.page_text(pdf_path, page).await?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            markdown_sections.push(trimmed.to_string());
            let mut element = DocumentElement::new(ElementType::Text, page);
            element.content = Some(trimmed.to_string());
            elements.push(element);
        }

        tracing::debug!(task_id, pages, elements = elements.len(), "surya fallback parsed");

        let annotations_generated = match annotations_dir {
            Some(dir) => {
                render_annotation_pages(
                    pdf_path,
                    dir,
                    self.settings.annotation_dpi,
                    self.settings.max_pages,
                )
                .await?
                    > 0
            }
            None => false,
        };

        Ok(RawExtraction {
            markdown_content: markdown_sections.join("\n\n"),
            elements,
            annotations_generated,
        })
    }
}
