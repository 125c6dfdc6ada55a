//! Backend abstraction for pluggable PDF extraction models.
//!
//! Backends differ wildly in how they extract (layout models, OCR, fallback
//! text dumps) but share one contract: PDF in, markdown plus ordered
//! elements out. The registry maps enabled model identifiers to adapter
//! instances, resolved once at orchestrator construction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DocumentElement;

/// Errors from extraction backends.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend not available: {0}")]
    NotAvailable(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Backend produced unreadable output: {0}")]
    InvalidOutput(String),

    #[error("Extraction timed out after {0}s")]
    Timeout(u64),

    #[error("Document has {pages} pages, backend limit is {max}")]
    UnsupportedPageCount { pages: u32, max: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Available extraction backend identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Docling document-understanding pipeline.
    Docling,
    /// MinerU scientific PDF extractor.
    Mineru,
    /// Surya OCR with Poppler fallback extraction.
    Surya,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Docling => "docling",
            BackendKind::Mineru => "mineru",
            BackendKind::Surya => "surya",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "docling" => Some(BackendKind::Docling),
            "mineru" => Some(BackendKind::Mineru),
            "surya" => Some(BackendKind::Surya),
            _ => None,
        }
    }

    /// All known backend identifiers, in catalog order.
    pub fn all() -> [BackendKind; 3] {
        [BackendKind::Docling, BackendKind::Mineru, BackendKind::Surya]
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw output of one backend invocation, before metrics and persistence.
#[derive(Debug, Clone)]
pub struct RawExtraction {
    /// Normalized markdown rendition of the document.
    pub markdown_content: String,
    /// Ordered structural elements.
    pub elements: Vec<DocumentElement>,
    /// Whether annotation page images were written to the requested
    /// directory.
    pub annotations_generated: bool,
}

/// Configuration shared by backend adapters.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Maximum page count a backend will accept.
    pub max_pages: u32,
    /// Render DPI for annotation page images.
    pub annotation_dpi: u32,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            max_pages: 100,
            annotation_dpi: 200,
        }
    }
}

/// Trait for extraction backends.
#[async_trait]
pub trait ExtractorBackend: Send + Sync {
    /// Get the backend identifier.
    fn kind(&self) -> BackendKind;

    /// Check if this backend can run (binaries installed, models present).
    fn is_available(&self) -> bool;

    /// Describe what is needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Extract markdown and elements from a PDF.
    ///
    /// When `annotations_dir` is set, the adapter also renders per-page
    /// annotation images into it. The source file is read-only; adapters
    /// must never mutate it.
    async fn extract(
        &self,
        pdf_path: &Path,
        task_id: &str,
        annotations_dir: Option<&Path>,
    ) -> Result<RawExtraction, BackendError>;
}

/// Check if a binary is resolvable in PATH.
pub(crate) fn check_binary(name: &Path) -> bool {
    which::which(name).is_ok()
}

/// Registry of extraction backends, resolved at orchestrator construction.
pub struct BackendRegistry {
    backends: Vec<Box<dyn ExtractorBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Build a registry containing adapters for the given enabled backends.
    pub fn with_enabled(enabled: &[BackendKind], settings: BackendSettings) -> Self {
        let mut registry = Self::new();
        for kind in enabled {
            match kind {
                BackendKind::Docling => {
                    registry.register(Box::new(super::DoclingBackend::with_settings(
                        settings.clone(),
                    )));
                }
                BackendKind::Mineru => {
                    registry.register(Box::new(super::MineruBackend::with_settings(
                        settings.clone(),
                    )));
                }
                BackendKind::Surya => {
                    registry.register(Box::new(super::SuryaBackend::with_settings(
                        settings.clone(),
                    )));
                }
            }
        }
        registry
    }

    /// Register a backend.
    pub fn register(&mut self, backend: Box<dyn ExtractorBackend>) {
        self.backends.push(backend);
    }

    /// Get a specific backend by kind.
    pub fn get(&self, kind: BackendKind) -> Option<&dyn ExtractorBackend> {
        self.backends
            .iter()
            .find(|b| b.kind() == kind)
            .map(|b| b.as_ref())
    }

    /// List registered backend kinds.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// List backends that can actually run.
    pub fn available_backends(&self) -> impl Iterator<Item = &dyn ExtractorBackend> {
        self.backends
            .iter()
            .filter(|b| b.is_available())
            .map(|b| b.as_ref())
    }

    /// Get a specific backend, validated and ready to use.
    pub fn get_ready(&self, kind: BackendKind) -> Result<&dyn ExtractorBackend, BackendError> {
        let backend = self
            .get(kind)
            .ok_or_else(|| BackendError::NotAvailable(format!("Backend {} not enabled", kind)))?;
        if !backend.is_available() {
            return Err(BackendError::NotAvailable(backend.availability_hint()));
        }
        Ok(backend)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_round_trip() {
        for kind in BackendKind::all() {
            assert_eq!(BackendKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(BackendKind::from_str("DOCLING"), Some(BackendKind::Docling));
        assert_eq!(BackendKind::from_str("tesseract"), None);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&BackendKind::Mineru).unwrap();
        assert_eq!(json, "\"mineru\"");
    }

    #[test]
    fn test_registry_rejects_unregistered_kind() {
        let registry = BackendRegistry::with_enabled(
            &[BackendKind::Docling],
            BackendSettings::default(),
        );
        assert!(registry.get(BackendKind::Surya).is_none());
        assert!(matches!(
            registry.get_ready(BackendKind::Surya),
            Err(BackendError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_registry_kinds_preserve_registration_order() {
        let registry = BackendRegistry::with_enabled(
            &[BackendKind::Mineru, BackendKind::Docling],
            BackendSettings::default(),
        );
        assert_eq!(
            registry.kinds(),
            vec![BackendKind::Mineru, BackendKind::Docling]
        );
    }
}
