//! Data models for pdfarena.

mod extraction;

pub use extraction::{
    ComparisonOutcome, ComparisonSummary, DocumentElement, ElementType, ExtractionMetrics,
    ExtractionResult, ExtractionStatus, Task, TaskState,
};
