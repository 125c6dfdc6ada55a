//! Task-scoped storage for uploads, markdown results, and annotation images.
//!
//! Layout on disk:
//! - `{upload_dir}/{task_id}/{filename}` — the uploaded source PDF
//! - `{results_dir}/{task_id}/content.md` — persisted markdown
//! - `{results_dir}/{task_id}/annotations/page_{n}.png` — annotation pages
//!
//! Every path is owned exclusively by its task id, so tasks never contend
//! for the same file.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage addressed by task id.
#[derive(Debug, Clone)]
pub struct ResultStore {
    upload_dir: PathBuf,
    results_dir: PathBuf,
}

impl ResultStore {
    pub fn new(upload_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            results_dir: results_dir.into(),
        }
    }

    /// Results directory for one task.
    pub fn task_dir(&self, task_id: &str) -> PathBuf {
        self.results_dir.join(task_id)
    }

    /// Annotations directory for one task.
    pub fn annotations_dir(&self, task_id: &str) -> PathBuf {
        self.task_dir(task_id).join("annotations")
    }

    /// Persist markdown content for a task. Returns the written path.
    pub async fn save_markdown(&self, task_id: &str, content: &str) -> Result<PathBuf, StorageError> {
        let dir = self.task_dir(task_id);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join("content.md");
        tokio::fs::write(&path, content.as_bytes()).await?;
        Ok(path)
    }

    /// Read back persisted markdown for a task.
    pub async fn load_markdown(&self, task_id: &str) -> Result<String, StorageError> {
        let path = self.task_dir(task_id).join("content.md");
        read_to_string(&path).await
    }

    /// Read one annotation page image for a task.
    pub async fn load_annotation(&self, task_id: &str, page: u32) -> Result<Vec<u8>, StorageError> {
        let path = self.annotations_dir(task_id).join(format!("page_{}.png", page));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Save an uploaded source file under the task's upload directory.
    pub async fn save_upload(
        &self,
        task_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let dir = self.upload_dir.join(task_id);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(sanitize_filename(filename));
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    /// Remove a task's upload directory. Results are kept.
    pub async fn cleanup_upload(&self, task_id: &str) -> Result<(), StorageError> {
        let dir = self.upload_dir.join(task_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

async fn read_to_string(path: &Path) -> Result<String, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StorageError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(StorageError::Io(e)),
    }
}

/// Replace path separators and control characters in client filenames.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "upload.pdf".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &Path) -> ResultStore {
        ResultStore::new(dir.join("uploads"), dir.join("results"))
    }

    #[tokio::test]
    async fn test_markdown_round_trip_is_byte_identical() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());

        let content = "# Títle\n\nbody — with unicode\n";
        store.save_markdown("task-1", content).await.unwrap();
        let loaded = store.load_markdown("task-1").await.unwrap();
        assert_eq!(loaded, content);
    }

    #[tokio::test]
    async fn test_load_markdown_not_found() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());

        let err = store.load_markdown("missing").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_annotation_path_layout() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());

        let dir = store.annotations_dir("task-9");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("page_2.png"), b"png-bytes")
            .await
            .unwrap();

        let bytes = store.load_annotation("task-9", 2).await.unwrap();
        assert_eq!(bytes, b"png-bytes");
        assert!(matches!(
            store.load_annotation("task-9", 3).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_upload_and_cleanup() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());

        let path = store
            .save_upload("task-2", "paper.pdf", b"%PDF-1.4")
            .await
            .unwrap();
        assert!(path.exists());

        store.cleanup_upload("task-2").await.unwrap();
        assert!(!path.exists());
        // Idempotent on a missing directory.
        store.cleanup_upload("task-2").await.unwrap();
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename(""), "upload.pdf");
    }

    #[test]
    fn test_task_dirs_are_disjoint_per_task() {
        let store = ResultStore::new("/u", "/r");
        assert_ne!(store.task_dir("a"), store.task_dir("b"));
        assert_eq!(store.task_dir("a"), PathBuf::from("/r/a"));
    }
}
