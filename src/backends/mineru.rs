//! MinerU extraction backend.
//!
//! Drives the `mineru` CLI via subprocess. MinerU is tuned for scientific
//! PDFs (LaTeX-style math, citations, figure/caption linking) and writes
//! markdown plus a content-list JSON describing every extracted block.
//!
//! Install with: `pip install mineru`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tempfile::TempDir;
use tokio::process::Command;

use super::backend::{
    check_binary, BackendError, BackendKind, BackendSettings, ExtractorBackend, RawExtraction,
};
use super::pdf_utils::{pdf_page_count, render_annotation_pages};
use crate::models::{DocumentElement, ElementType};

/// MinerU backend using the `mineru` CLI.
pub struct MineruBackend {
    settings: BackendSettings,
    /// Path to the mineru binary.
    binary_path: PathBuf,
}

impl MineruBackend {
    pub fn new() -> Self {
        Self {
            settings: BackendSettings::default(),
            binary_path: PathBuf::from("mineru"),
        }
    }

    pub fn with_settings(settings: BackendSettings) -> Self {
        Self {
            settings,
            binary_path: PathBuf::from("mineru"),
        }
    }

    /// Set the path to the mineru binary.
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    async fn run_mineru(&self, pdf_path: &Path, out_dir: &Path) -> Result<(), BackendError> {
        let output = Command::new(&self.binary_path)
            .arg("-p")
            .arg(pdf_path)
            .arg("-o")
            .arg(out_dir)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(BackendError::ExtractionFailed(format!(
                    "mineru failed: {}",
                    stderr
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BackendError::NotAvailable(
                "mineru not found. Install with: pip install mineru".to_string(),
            )),
            Err(e) => Err(BackendError::Io(e)),
        }
    }
}

impl Default for MineruBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractorBackend for MineruBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mineru
    }

    fn is_available(&self) -> bool {
        check_binary(&self.binary_path)
    }

    fn availability_hint(&self) -> String {
        if !check_binary(&self.binary_path) {
            format!(
                "mineru not found at '{}'. Install with: pip install mineru",
                self.binary_path.display()
            )
        } else {
            "MinerU is available".to_string()
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

        let out_dir = TempDir::new()?;
        self.run_mineru(pdf_path, out_dir.path()).await?;

        // MinerU nests output under {out}/{stem}/auto/; locate by suffix
        // instead of hardcoding the layout.
        let markdown_path = find_output_file(out_dir.path(), ".md").ok_or_else(|| {
            BackendError::InvalidOutput("mineru produced no markdown file".to_string())
        })?;
        let content_list_path = find_output_file(out_dir.path(), "_content_list.json")
            .ok_or_else(|| {
                BackendError::InvalidOutput("mineru produced no content list".to_string())
            })?;

        let markdown_content = tokio::fs::read_to_string(&markdown_path).await?;
        let content_list = tokio::fs::read_to_string(&content_list_path).await?;

        let elements = parse_content_list(&content_list)?;
        tracing::debug!(
            task_id,
            elements = elements.len(),
            "mineru extraction parsed"
        );

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
            markdown_content,
            elements,
            annotations_generated,
        })
    }
}

/// Find the first file under `dir` whose name ends with `suffix`.
fn find_output_file(dir: &Path, suffix: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix))
        {
            return Some(path);
        }
    }

    subdirs.into_iter().find_map(|d| find_output_file(&d, suffix))
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    page_idx: u32,
    #[serde(default)]
    bbox: Option<[f64; 4]>,
}

/// Fold MinerU's content list into the shared element model.
///
/// MinerU pages are 0-indexed; the shared model is 1-indexed.
fn parse_content_list(json: &str) -> Result<Vec<DocumentElement>, BackendError> {
    let items: Vec<ContentItem> = serde_json::from_str(json)
        .map_err(|e| BackendError::InvalidOutput(format!("mineru content list: {}", e)))?;

    Ok(items
        .into_iter()
        .map(|item| DocumentElement {
            element_type: ElementType::from_label(&item.kind),
            page: item.page_idx + 1,
            content: item.text.filter(|t| !t.is_empty()),
            bbox: item.bbox,
        })
        .collect())
}
