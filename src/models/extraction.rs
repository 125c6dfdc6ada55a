//! Extraction task and result models.
//!
//! One `Task` per orchestration call. Comparison requests decompose into one
//! child sub-task per backend so per-backend results stay addressable on
//! their own (annotation pages, markdown downloads).

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backends::BackendKind;

/// Lifecycle state of an extraction task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One orchestrated extraction request.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique task identifier (UUIDv4 for parents, `{parent}_{backend}` for
    /// per-backend sub-tasks).
    pub id: String,
    /// Backends selected for this task.
    pub backends: Vec<BackendKind>,
    /// Lifecycle state.
    pub state: TaskState,
    /// Source PDF path (read-only, shared by all sub-tasks).
    pub source_file: PathBuf,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(id: String, backends: Vec<BackendKind>, source_file: PathBuf) -> Self {
        Self {
            id,
            backends,
            state: TaskState::Pending,
            source_file,
            created_at: Utc::now(),
        }
    }

    /// Derive the sub-task id for one backend of a comparison task.
    pub fn child_id(parent_id: &str, backend: BackendKind) -> String {
        format!("{}_{}", parent_id, backend.as_str())
    }
}

/// Structural element types produced by extraction backends.
///
/// Backends label elements in their own vocabulary; `from_label` folds the
/// common spellings into this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Text,
    Heading,
    Table,
    Figure,
    Formula,
    ListItem,
    Caption,
    Code,
    Footnote,
    PageHeader,
    PageFooter,
    Unknown,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading => "heading",
            Self::Table => "table",
            Self::Figure => "figure",
            Self::Formula => "formula",
            Self::ListItem => "list_item",
            Self::Caption => "caption",
            Self::Code => "code",
            Self::Footnote => "footnote",
            Self::PageHeader => "page_header",
            Self::PageFooter => "page_footer",
            Self::Unknown => "unknown",
        }
    }

    /// Map a backend-specific element label to the shared type.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "text" | "paragraph" | "text_block" | "plain text" => Self::Text,
            "heading" | "title" | "section_header" | "section-header" | "subtitle-level-1" => {
                Self::Heading
            }
            "table" => Self::Table,
            "figure" | "picture" | "image" => Self::Figure,
            "formula" | "equation" | "interline_equation" | "inline_equation" => Self::Formula,
            "list_item" | "list-item" | "list" => Self::ListItem,
            "caption" | "figure_caption" | "table_caption" => Self::Caption,
            "code" | "code_block" => Self::Code,
            "footnote" | "table_footnote" => Self::Footnote,
            "page_header" | "page-header" => Self::PageHeader,
            "page_footer" | "page-footer" => Self::PageFooter,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structural unit extracted from a page.
///
/// Produced only by backend adapters; immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentElement {
    /// Element type.
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// 1-indexed page number.
    pub page: u32,
    /// Text content, where the backend provides it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Bounding box `[x0, y0, x1, y1]` in backend coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
}

impl DocumentElement {
    pub fn new(element_type: ElementType, page: u32) -> Self {
        Self {
            element_type,
            page,
            content: None,
            bbox: None,
        }
    }
}

/// Outcome status of one backend invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Completed,
    Failed,
}

/// Metrics derived from one completed extraction.
///
/// Computed once, immutable. `sum(element_counts.values())` always equals
/// `num_elements`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    /// Wall-clock extraction time in seconds.
    pub extraction_time: f64,
    /// Distinct page numbers seen across elements.
    pub num_pages: usize,
    /// Total element count.
    pub num_elements: usize,
    /// Element count per type.
    pub element_counts: HashMap<ElementType, usize>,
    /// Markdown length in Unicode codepoints.
    pub character_count: usize,
    /// Whitespace-delimited token count of the markdown.
    pub word_count: usize,
}

/// The outcome of one backend invocation for one task.
///
/// On failure, markdown/elements/metrics are absent and `error` carries the
/// captured description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub task_id: String,
    pub model: BackendKind,
    pub status: ExtractionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_content: Option<String>,
    #[serde(default)]
    pub elements: Vec<DocumentElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ExtractionMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// Build a failed result carrying an error description.
    pub fn failed(task_id: String, model: BackendKind, error: String) -> Self {
        Self {
            task_id,
            model,
            status: ExtractionStatus::Failed,
            markdown_content: None,
            elements: Vec::new(),
            metrics: None,
            annotations_url: None,
            error: Some(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExtractionStatus::Completed
    }
}

/// Cross-backend rankings over >= 2 completed results of one parent task.
///
/// Winners resolve by strict comparison in caller-supplied backend order:
/// on an exact tie the backend listed earliest wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub fastest_model: BackendKind,
    pub most_elements_model: BackendKind,
    pub longest_content_model: BackendKind,
    /// Model -> extraction time in seconds.
    pub speed_comparison: HashMap<BackendKind, f64>,
    /// Model -> element count.
    pub element_comparison: HashMap<BackendKind, usize>,
    /// Model -> markdown character count.
    pub content_length_comparison: HashMap<BackendKind, usize>,
}

/// Full outcome of a comparison request: per-backend results in the
/// caller-supplied order, plus the comparison when >= 2 backends completed.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonOutcome {
    pub task_id: String,
    /// Per-backend results, in the caller-supplied backend order.
    pub results: Vec<ExtractionResult>,
    /// Absent (not a zero-filled stub) when fewer than two backends
    /// completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonSummary>,
}

impl ComparisonOutcome {
    /// Look up the result for one backend.
    pub fn result_for(&self, backend: BackendKind) -> Option<&ExtractionResult> {
        self.results.iter().find(|r| r.model == backend)
    }
}
