//! Docling extraction backend.
//!
//! Drives the `docling` CLI via subprocess. Docling runs layout analysis,
//! table structure recovery, and formula recognition, and exports both a
//! markdown rendition and a lossless JSON document that we fold into the
//! shared element model.
//!
//! Install with: `pip install docling`

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

/// Docling backend using the `docling` CLI.
pub struct DoclingBackend {
    settings: BackendSettings,
    /// Path to the docling binary.
    binary_path: PathBuf,
}

impl DoclingBackend {
    pub fn new() -> Self {
        Self {
            settings: BackendSettings::default(),
            binary_path: PathBuf::from("docling"),
        }
    }

    pub fn with_settings(settings: BackendSettings) -> Self {
        Self {
            settings,
            binary_path: PathBuf::from("docling"),
        }
    }

    /// Set the path to the docling binary.
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Run docling, exporting markdown and JSON into `out_dir`.
    async fn run_docling(&self, pdf_path: &Path, out_dir: &Path) -> Result<(), BackendError> {
        let output = Command::new(&self.binary_path)
            .args(["--to", "md", "--to", "json"])
            .arg("--output")
            .arg(out_dir)
            .arg(pdf_path)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(BackendError::ExtractionFailed(format!(
                    "docling failed: {}",
                    stderr
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BackendError::NotAvailable(
                "docling not found. Install with: pip install docling".to_string(),
            )),
            Err(e) => Err(BackendError::Io(e)),
        }
    }
}

impl Default for DoclingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractorBackend for DoclingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Docling
    }

    fn is_available(&self) -> bool {
        check_binary(&self.binary_path)
    }

    fn availability_hint(&self) -> String {
        if !check_binary(&self.binary_path) {
            format!(
                "docling not found at '{}'. Install with: pip install docling",
                self.binary_path.display()
            )
        } else {
            "Docling is available".to_string()
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
        self.run_docling(pdf_path, out_dir.path()).await?;

        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let markdown_path = out_dir.path().join(format!("{}.md", stem));
        let json_path = out_dir.path().join(format!("{}.json", stem));

        let markdown_content = tokio::fs::read_to_string(&markdown_path)
            .await
            .map_err(|e| {
                BackendError::InvalidOutput(format!("docling produced no markdown: {}", e))
            })?;
        let json_content = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            BackendError::InvalidOutput(format!("docling produced no JSON document: {}", e))
        })?;

        let elements = parse_docling_document(&json_content)?;
        tracing::debug!(
            task_id,
            elements = elements.len(),
            "docling extraction parsed"
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

#[derive(Debug, Deserialize)]
struct DoclingDocument {
    #[serde(default)]
    texts: Vec<DoclingItem>,
    #[serde(default)]
    tables: Vec<DoclingItem>,
    #[serde(default)]
    pictures: Vec<DoclingItem>,
}

#[derive(Debug, Deserialize)]
struct DoclingItem {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    prov: Vec<DoclingProv>,
}

#[derive(Debug, Deserialize)]
struct DoclingProv {
    page_no: u32,
    #[serde(default)]
    bbox: Option<DoclingBbox>,
}

#[derive(Debug, Deserialize)]
struct DoclingBbox {
    l: f64,
    t: f64,
    r: f64,
    b: f64,
}

/// Fold docling's lossless JSON document into the shared element model.
///
/// Items without provenance carry no page anchor and are skipped; docling
/// emits these for furniture like the document body node.
fn parse_docling_document(json: &str) -> Result<Vec<DocumentElement>, BackendError> {
    let doc: DoclingDocument = serde_json::from_str(json)
        .map_err(|e| BackendError::InvalidOutput(format!("docling JSON: {}", e)))?;

    let mut elements = Vec::new();
    collect_items(&doc.texts, None, &mut elements);
    collect_items(&doc.tables, Some(ElementType::Table), &mut elements);
    collect_items(&doc.pictures, Some(ElementType::Figure), &mut elements);
    Ok(elements)
}

fn collect_items(
    items: &[DoclingItem],
    forced_type: Option<ElementType>,
    out: &mut Vec<DocumentElement>,
) {
    for item in items {
        let Some(prov) = item.prov.first() else {
            continue;
        };
        let element_type = forced_type.unwrap_or_else(|| {
            item.label
                .as_deref()
                .map(ElementType::from_label)
                .unwrap_or(ElementType::Text)
        });
        out.push(DocumentElement {
            element_type,
            page: prov.page_no,
            content: item.text.clone().filter(|t| !t.is_empty()),
            bbox: prov.bbox.as_ref().map(|b| [b.l, b.t, b.r, b.b]),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "texts": [
            {"label": "section_header", "text": "Intro", "prov": [{"page_no": 1, "bbox": {"l": 10.0, "t": 20.0, "r": 200.0, "b": 40.0}}]},
            {"label": "text", "text": "Body", "prov": [{"page_no": 2}]},
            {"label": "text", "text": "No provenance"}
        ],
        "tables": [
            {"prov": [{"page_no": 2}]}
        ],
        "pictures": [
            {"prov": [{"page_no": 3}]}
        ]
    }"#;

    #[test]
    fn test_parse_docling_document() {
        let elements = parse_docling_document(SAMPLE).unwrap();
        assert_eq!(elements.len(), 4);

        assert_eq!(elements[0].element_type, ElementType::Heading);
        assert_eq!(elements[0].page, 1);
        assert_eq!(elements[0].bbox, Some([10.0, 20.0, 200.0, 40.0]));

        assert_eq!(elements[2].element_type, ElementType::Table);
        assert_eq!(elements[3].element_type, ElementType::Figure);
        assert_eq!(elements[3].page, 3);
    }

    #[test]
    fn test_parse_docling_document_rejects_malformed() {
        assert!(matches!(
            parse_docling_document("not json"),
            Err(BackendError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_parse_docling_document_empty() {
        let elements = parse_docling_document("{}").unwrap();
        assert!(elements.is_empty());
    }
}
