//! CLI commands implementation.
//!
//! The parser dispatches to one function per subcommand; extraction
//! commands build a `PdfProcessor` directly, the serve command hands off
//! to the web server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use crate::backends::{catalog, BackendKind};
use crate::config::Settings;
use crate::models::{ComparisonOutcome, ExtractionResult, ExtractionStatus};
use crate::server;
use crate::services::PdfProcessor;

#[derive(Parser)]
#[command(name = "pdfarena")]
#[command(about = "PDF extraction model comparison service")]
#[command(version)]
pub struct Cli {
    /// Data directory for uploads and results (overrides environment)
    #[arg(long, short = 't', global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extraction API server
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Extract a PDF with a single backend
    Extract {
        /// PDF file to extract
        file: PathBuf,

        /// Backend to use (docling, mineru, surya)
        #[arg(short, long, default_value = "docling")]
        backend: String,

        /// Render annotation page images
        #[arg(long)]
        annotations: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract a PDF with 2-3 backends and compare the results
    Compare {
        /// PDF file to extract
        file: PathBuf,

        /// Comma-separated backends, e.g. 'docling,mineru'
        #[arg(short, long, default_value = "docling,mineru")]
        backends: String,

        /// Render annotation page images
        #[arg(long)]
        annotations: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List extraction backends and their capabilities
    Models,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(dir) = cli.data_dir {
        settings.upload_dir = dir.join("uploads");
        settings.results_dir = dir.join("results");
        settings.data_dir = dir;
    }

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            server::serve(settings).await
        }
        Commands::Extract {
            file,
            backend,
            annotations,
            json,
        } => cmd_extract(settings, &file, &backend, annotations, json).await,
        Commands::Compare {
            file,
            backends,
            annotations,
            json,
        } => cmd_compare(settings, &file, &backends, annotations, json).await,
        Commands::Models => {
            cmd_models();
            Ok(())
        }
    }
}

/// Parse a backend name, listing the valid set on failure.
fn parse_backend(name: &str) -> anyhow::Result<BackendKind> {
    BackendKind::from_str(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown backend '{}'. Available: docling, mineru, surya",
            name
        )
    })
}

/// Parse a comma-separated backend list.
fn parse_backend_list(spec: &str) -> anyhow::Result<Vec<BackendKind>> {
    spec.split(',')
        .map(|s| parse_backend(s.trim()))
        .collect()
}

async fn cmd_extract(
    settings: Settings,
    file: &std::path::Path,
    backend: &str,
    annotations: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let backend = parse_backend(backend)?;

    settings.ensure_directories()?;
    let processor = PdfProcessor::from_settings(settings);

    eprintln!("Extracting {} with {}...", file.display(), backend);
    let result = processor.process_single(file, backend, annotations).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result_summary(&result);
    }
    Ok(())
}

async fn cmd_compare(
    settings: Settings,
    file: &std::path::Path,
    backends_spec: &str,
    annotations: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let backends = parse_backend_list(backends_spec)?;

    settings.ensure_directories()?;
    let processor = PdfProcessor::from_settings(settings);

    eprintln!(
        "Processing {} with {} backend(s)...",
        file.display(),
        backends.len()
    );
    let outcome = processor
        .process_comparison(file, &backends, annotations)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_comparison_summary(file, &outcome);
    }
    Ok(())
}

fn cmd_models() {
    for info in catalog() {
        println!(
            "{} ({})",
            style(info.display_name).cyan().bold(),
            info.name
        );
        println!("  {}", info.description);
        println!("  Speed: {}", info.average_speed);
        println!(
            "  GPU required: {}",
            if info.gpu_required { "yes" } else { "no" }
        );
        println!("  Recommended for: {}", info.recommended_for.join(", "));
        println!();
    }
}

fn print_result_summary(result: &ExtractionResult) {
    println!("Task: {}", result.task_id);
    println!("Model: {}", result.model);
    if let Some(metrics) = &result.metrics {
        println!("Time: {:.2}s", metrics.extraction_time);
        println!("Pages: {}", metrics.num_pages);
        println!("Elements: {}", metrics.num_elements);
        println!(
            "Content: {} chars, {} words",
            metrics.character_count, metrics.word_count
        );
    }
    if let Some(url) = &result.annotations_url {
        println!("Annotations: {}", url);
    }
}

fn print_comparison_summary(file: &std::path::Path, outcome: &ComparisonOutcome) {
    let width = 72;
    println!("{}", "═".repeat(width));
    println!("Extraction Comparison: {}", file.display());
    println!("{}", "═".repeat(width));

    println!(
        "{:<10} {:>10} {:>8} {:>10} {:>10} {:>8}",
        "Backend", "Status", "Time", "Pages", "Elements", "Chars"
    );
    println!("{}", "─".repeat(width));

    for result in &outcome.results {
        match (&result.status, &result.metrics) {
            (ExtractionStatus::Completed, Some(metrics)) => {
                let fastest = outcome
                    .comparison
                    .as_ref()
                    .is_some_and(|c| c.fastest_model == result.model);
                let marker = if fastest {
                    style(" fastest").green().to_string()
                } else {
                    String::new()
                };
                println!(
                    "{:<10} {:>10} {:>7.2}s {:>10} {:>10} {:>8}{}",
                    result.model.as_str(),
                    "completed",
                    metrics.extraction_time,
                    metrics.num_pages,
                    metrics.num_elements,
                    metrics.character_count,
                    marker
                );
            }
            _ => {
                println!(
                    "{:<10} {:>10}",
                    result.model.as_str(),
                    style("failed").red()
                );
            }
        }
    }

    if let Some(comparison) = &outcome.comparison {
        println!();
        println!("{}", style("Winners").bold());
        println!("{}", "─".repeat(width));
        println!("Fastest:         {}", comparison.fastest_model);
        println!("Most elements:   {}", comparison.most_elements_model);
        println!("Longest content: {}", comparison.longest_content_model);
    } else {
        println!();
        println!(
            "{}",
            style("Fewer than two backends completed; no comparison.").yellow()
        );
    }

    let failures: Vec<_> = outcome
        .results
        .iter()
        .filter(|r| r.status == ExtractionStatus::Failed)
        .collect();
    if !failures.is_empty() {
        println!();
        println!("{}", style("Errors:").red().bold());
        for result in failures {
            println!(
                "  {}: {}",
                result.model,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_list() {
        let parsed = parse_backend_list("docling, mineru").unwrap();
        assert_eq!(parsed, vec![BackendKind::Docling, BackendKind::Mineru]);
    }

    #[test]
    fn test_parse_backend_list_rejects_unknown() {
        assert!(parse_backend_list("docling,unknown").is_err());
    }
}
