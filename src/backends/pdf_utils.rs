//! Shared Poppler helpers for backend adapters.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::backend::BackendError;

const PDFTOPPM_HINT: &str = "pdftoppm not installed. Install with: apt install poppler-utils";
const PDFINFO_HINT: &str = "pdfinfo not installed. Install with: apt install poppler-utils";

/// Read the page count of a PDF via pdfinfo.
pub async fn pdf_page_count(pdf_path: &Path) -> Result<u32, BackendError> {
    let output = Command::new("pdfinfo").arg(pdf_path).output().await;

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            parse_page_count(&stdout).ok_or_else(|| {
                BackendError::InvalidOutput("pdfinfo output had no Pages line".to_string())
            })
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(BackendError::ExtractionFailed(format!(
                "pdfinfo failed: {}",
                stderr
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BackendError::NotAvailable(PDFINFO_HINT.to_string()))
        }
        Err(e) => Err(BackendError::Io(e)),
    }
}

/// Parse the `Pages:` line of pdfinfo output.
fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

/// Render per-page annotation images into `out_dir` as `page_{n}.png`.
///
/// Returns the number of pages rendered.
pub async fn render_annotation_pages(
    pdf_path: &Path,
    out_dir: &Path,
    dpi: u32,
    max_pages: u32,
) -> Result<u32, BackendError> {
    tokio::fs::create_dir_all(out_dir).await?;

    let prefix = out_dir.join("page");
    let status = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string(), "-l", &max_pages.to_string()])
        .arg(pdf_path)
        .arg(&prefix)
        .status()
        .await;

    match status {
        Ok(s) if s.success() => normalize_page_names(out_dir).await,
        Ok(_) => Err(BackendError::ExtractionFailed(
            "pdftoppm failed to render PDF pages".to_string(),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BackendError::NotAvailable(PDFTOPPM_HINT.to_string()))
        }
        Err(e) => Err(BackendError::Io(e)),
    }
}

/// Rename pdftoppm output to stable `page_{n}.png` names.
///
/// pdftoppm pads page numbers to the total page count width (page-01.png,
/// page-002.png), which would make retrieval paths depend on document size.
async fn normalize_page_names(out_dir: &Path) -> Result<u32, BackendError> {
    let mut rendered = 0u32;
    let mut entries = tokio::fs::read_dir(out_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(page) = parse_rendered_page(&path) {
            let target = out_dir.join(format!("page_{}.png", page));
            tokio::fs::rename(&path, &target).await?;
            rendered += 1;
        }
    }
    Ok(rendered)
}

/// Extract the page number from a pdftoppm output filename.
fn parse_rendered_page(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let digits = name.strip_prefix("page-")?.strip_suffix(".png")?;
    digits.parse().ok()
}

/// Expected annotation image path for one page.
#[allow(dead_code)]
pub fn annotation_page_path(annotations_dir: &Path, page: u32) -> PathBuf {
    annotations_dir.join(format!("page_{}.png", page))
}
