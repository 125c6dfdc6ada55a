//! Read-only backend catalog for the models endpoints.

use serde::Serialize;

use super::backend::BackendKind;

/// Descriptive information about one extraction backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub name: BackendKind,
    pub display_name: &'static str,
    pub description: &'static str,
    pub capabilities: Vec<&'static str>,
    pub strengths: Vec<&'static str>,
    pub limitations: Vec<&'static str>,
    pub recommended_for: Vec<&'static str>,
    pub average_speed: &'static str,
    pub gpu_required: bool,
}

/// Catalog entry for one backend.
pub fn backend_info(kind: BackendKind) -> BackendInfo {
    match kind {
        BackendKind::Docling => BackendInfo {
            name: kind,
            display_name: "Docling",
            description: "Advanced document understanding framework with layout analysis",
            capabilities: vec![
                "Layout detection",
                "Table extraction",
                "Formula recognition",
                "Multi-column support",
                "Figure extraction",
            ],
            strengths: vec![
                "Excellent for complex academic papers",
                "Superior table structure preservation",
                "Handles multi-column layouts well",
                "Good formula recognition",
            ],
            limitations: vec![
                "Slower processing speed",
                "Requires more GPU memory",
                "May struggle with handwritten text",
            ],
            recommended_for: vec![
                "Scientific papers",
                "Research documents",
                "Technical reports",
                "Documents with complex tables",
            ],
            average_speed: "~5-10 seconds per page",
            gpu_required: true,
        },
        BackendKind::Mineru => BackendInfo {
            name: kind,
            display_name: "MinerU",
            description: "Specialized PDF extraction tool optimized for scientific documents",
            capabilities: vec![
                "Scientific document parsing",
                "Mathematical notation",
                "Citation extraction",
                "Bibliography parsing",
                "Figure and caption linking",
            ],
            strengths: vec![
                "Optimized for academic papers",
                "Excellent LaTeX formula extraction",
                "Good bibliography handling",
                "Fast processing",
            ],
            limitations: vec![
                "Less effective on non-academic documents",
                "May miss complex layouts",
                "Limited table extraction",
            ],
            recommended_for: vec![
                "Academic papers",
                "ArXiv documents",
                "Mathematical texts",
                "Papers with equations",
            ],
            average_speed: "~3-7 seconds per page",
            gpu_required: true,
        },
        BackendKind::Surya => BackendInfo {
            name: kind,
            display_name: "Surya",
            description: "Multilingual OCR with advanced layout analysis and fallback extraction",
            capabilities: vec![
                "90+ language support",
                "Layout detection",
                "Reading order detection",
                "Text line detection",
                "Robust OCR with fallback",
            ],
            strengths: vec![
                "Excellent multilingual support",
                "Fast processing with Poppler fallback",
                "Good for scanned documents",
                "Reliable text extraction",
            ],
            limitations: vec![
                "Limited table structure extraction",
                "No formula recognition",
                "Uses fallback extraction currently",
            ],
            recommended_for: vec![
                "Multilingual documents",
                "Scanned PDFs",
                "Simple text extraction",
                "Non-English documents",
            ],
            average_speed: "~2-5 seconds per page",
            gpu_required: false,
        },
    }
}

/// All catalog entries, in catalog order.
pub fn catalog() -> Vec<BackendInfo> {
    BackendKind::all().into_iter().map(backend_info).collect()
}
