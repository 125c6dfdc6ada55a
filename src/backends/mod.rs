//! Extraction backend adapters.
//!
//! Routes PDFs to document-understanding models:
//! - Docling for layout-heavy documents (tables, formulas, multi-column)
//! - MinerU for scientific documents and LaTeX-style math
//! - Surya for multilingual text with Poppler fallback extraction
//!
//! Each backend is an opaque capability behind the `ExtractorBackend` trait:
//! given a PDF it produces markdown plus an ordered element sequence. Use
//! `BackendRegistry` to resolve backends per request and to compare results
//! across models.

mod backend;
mod docling;
mod info;
mod mineru;
mod pdf_utils;
mod surya;

pub use backend::{
    BackendError, BackendKind, BackendRegistry, BackendSettings, ExtractorBackend, RawExtraction,
};
pub use docling::DoclingBackend;
pub use info::{backend_info, catalog, BackendInfo};
pub use mineru::MineruBackend;
pub use surya::SuryaBackend;
