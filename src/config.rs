//! Application settings.

use std::fs;
use std::path::PathBuf;

use crate::backends::BackendKind;

/// Default uploads subdirectory name.
const UPLOADS_SUBDIR: &str = "uploads";
/// Default results subdirectory name.
const RESULTS_SUBDIR: &str = "results";

/// Application settings.
///
/// Injected as a value object; everything here comes from the environment
/// (or defaults) and is never mutated after startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind host for the HTTP server.
    pub host: String,
    /// Bind port for the HTTP server.
    pub port: u16,
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Directory for uploaded source files (one subdirectory per task).
    pub upload_dir: PathBuf,
    /// Directory for extraction results (one subdirectory per task).
    pub results_dir: PathBuf,
    /// Maximum upload size in bytes.
    pub max_file_size: u64,
    /// Backends enabled for extraction requests.
    pub enabled_backends: Vec<BackendKind>,
    /// Whether annotation images are generated when the caller does not say.
    pub default_annotations: bool,
    /// Per-client request rate limit, consumed by the transport layer.
    pub rate_limit_per_minute: u32,
    /// Timeout for one backend invocation, in seconds.
    pub backend_timeout_secs: u64,
    /// Maximum concurrently running backend invocations per process.
    pub max_concurrent_extractions: usize,
    /// Maximum page count accepted per document.
    pub max_pages: u32,
    /// Render DPI for annotation page images.
    pub annotation_dpi: u32,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/pdfarena/ for user data
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pdfarena");

        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            upload_dir: data_dir.join(UPLOADS_SUBDIR),
            results_dir: data_dir.join(RESULTS_SUBDIR),
            data_dir,
            max_file_size: 50 * 1024 * 1024,
            enabled_backends: vec![BackendKind::Docling, BackendKind::Mineru, BackendKind::Surya],
            default_annotations: true,
            rate_limit_per_minute: 10,
            backend_timeout_secs: 600,
            max_concurrent_extractions: 3,
            max_pages: 100,
            annotation_dpi: 200,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            upload_dir: data_dir.join(UPLOADS_SUBDIR),
            results_dir: data_dir.join(RESULTS_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Load settings from the environment, applying defaults for anything
    /// unset. `.env` files are honored when loaded by the binary entry.
    pub fn from_env() -> Self {
        let mut settings = match env_var("PDFARENA_DATA_DIR") {
            Some(dir) => Self::with_data_dir(PathBuf::from(dir)),
            None => Self::default(),
        };

        if let Some(host) = env_var("PDFARENA_HOST") {
            settings.host = host;
        }
        if let Some(port) = env_parse("PDFARENA_PORT") {
            settings.port = port;
        }
        if let Some(dir) = env_var("PDFARENA_UPLOAD_DIR") {
            settings.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_var("PDFARENA_RESULTS_DIR") {
            settings.results_dir = PathBuf::from(dir);
        }
        if let Some(size) = env_parse("PDFARENA_MAX_FILE_SIZE") {
            settings.max_file_size = size;
        }
        if let Some(backends) = env_var("PDFARENA_BACKENDS") {
            let parsed: Vec<BackendKind> = backends
                .split(',')
                .filter_map(|s| BackendKind::from_str(s.trim()))
                .collect();
            if !parsed.is_empty() {
                settings.enabled_backends = parsed;
            }
        }
        if let Some(flag) = env_var("PDFARENA_DEFAULT_ANNOTATIONS") {
            settings.default_annotations =
                flag.eq_ignore_ascii_case("1") || flag.eq_ignore_ascii_case("true");
        }
        if let Some(limit) = env_parse("PDFARENA_RATE_LIMIT_PER_MINUTE") {
            settings.rate_limit_per_minute = limit;
        }
        if let Some(timeout) = env_parse("PDFARENA_BACKEND_TIMEOUT_SECS") {
            settings.backend_timeout_secs = timeout;
        }
        if let Some(workers) = env_parse("PDFARENA_MAX_CONCURRENT") {
            settings.max_concurrent_extractions = workers;
        }
        if let Some(pages) = env_parse("PDFARENA_MAX_PAGES") {
            settings.max_pages = pages;
        }
        if let Some(dpi) = env_parse("PDFARENA_ANNOTATION_DPI") {
            settings.annotation_dpi = dpi;
        }

        settings
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (dir, label) in [
            (&self.data_dir, "data directory"),
            (&self.upload_dir, "upload directory"),
            (&self.results_dir, "results directory"),
        ] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to create {} '{}': {}", label, dir.display(), e),
                )
            })?;
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.max_file_size, 52_428_800);
        assert_eq!(settings.enabled_backends.len(), 3);
        assert_eq!(settings.rate_limit_per_minute, 10);
        assert!(settings.upload_dir.ends_with("uploads"));
        assert!(settings.results_dir.ends_with("results"));
    }

    #[test]
    fn test_with_data_dir_derives_subdirs() {
        let settings = Settings::with_data_dir(PathBuf::from("/srv/arena"));
        assert_eq!(settings.upload_dir, PathBuf::from("/srv/arena/uploads"));
        assert_eq!(settings.results_dir, PathBuf::from("/srv/arena/results"));
    }

    #[test]
    fn test_ensure_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::with_data_dir(tmp.path().join("arena"));
        settings.ensure_directories().unwrap();
        assert!(settings.upload_dir.is_dir());
        assert!(settings.results_dir.is_dir());
    }
}
