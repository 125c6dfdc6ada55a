//! Shared utility functions.

use std::path::Path;

use thiserror::Error;

/// Errors from upload validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No filename provided")]
    MissingFilename,

    #[error("Invalid file type: {0}. Only PDF files are allowed.")]
    InvalidExtension(String),

    #[error("File content is not a PDF")]
    NotAPdf,

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large. Maximum size is {max_mb}MB")]
    TooLarge { max_mb: u64 },
}

/// Validate an uploaded PDF by name, size, and content.
///
/// The extension check mirrors what clients see in error messages; the
/// `infer` sniff is what actually gates acceptance, since extensions lie.
pub fn validate_pdf(filename: &str, content: &[u8], max_file_size: u64) -> Result<(), ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::MissingFilename);
    }

    let extension = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if extension != "pdf" {
        return Err(ValidationError::InvalidExtension(format!(".{}", extension)));
    }

    if content.is_empty() {
        return Err(ValidationError::EmptyFile);
    }

    if content.len() as u64 > max_file_size {
        return Err(ValidationError::TooLarge {
            max_mb: max_file_size / (1024 * 1024),
        });
    }

    let is_pdf = infer::get(content)
        .map(|kind| kind.mime_type() == "application/pdf")
        .unwrap_or(false);
    if !is_pdf {
        return Err(ValidationError::NotAPdf);
    }

    Ok(())
}
