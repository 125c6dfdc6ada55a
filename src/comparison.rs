//! Cross-backend comparison aggregation.
//!
//! Rankings are computed in a single pass over the caller-supplied order
//! using strict comparisons, so the earliest backend wins exact ties no
//! matter which backend finished first.

use std::collections::HashMap;

use thiserror::Error;

use crate::backends::BackendKind;
use crate::models::{ComparisonSummary, ExtractionMetrics};

/// Raised when the aggregator is invoked with fewer than two results.
///
/// A contract error, not a user-facing condition: callers must check the
/// completed-result count (or skip aggregation) before invoking.
#[derive(Debug, Error)]
#[error("comparison requires at least 2 completed results, got {0}")]
pub struct InsufficientResultsError(pub usize);

/// Rank >= 2 completed results of the same parent task.
///
/// Input order is the caller's original backend selection order and defines
/// tie-break precedence.
pub fn aggregate(
    results: &[(BackendKind, &ExtractionMetrics)],
) -> Result<ComparisonSummary, InsufficientResultsError> {
    if results.len() < 2 {
        return Err(InsufficientResultsError(results.len()));
    }

    let mut speed_comparison = HashMap::new();
    let mut element_comparison = HashMap::new();
    let mut content_length_comparison = HashMap::new();

    let (first_model, first_metrics) = results[0];
    let mut fastest = (first_model, first_metrics.extraction_time);
    let mut most_elements = (first_model, first_metrics.num_elements);
    let mut longest_content = (first_model, first_metrics.character_count);

    for &(model, metrics) in results {
        speed_comparison.insert(model, metrics.extraction_time);
        element_comparison.insert(model, metrics.num_elements);
        content_length_comparison.insert(model, metrics.character_count);

        if metrics.extraction_time < fastest.1 {
            fastest = (model, metrics.extraction_time);
        }
        if metrics.num_elements > most_elements.1 {
            most_elements = (model, metrics.num_elements);
        }
        if metrics.character_count > longest_content.1 {
            longest_content = (model, metrics.character_count);
        }
    }

    Ok(ComparisonSummary {
        fastest_model: fastest.0,
        most_elements_model: most_elements.0,
        longest_content_model: longest_content.0,
        speed_comparison,
        element_comparison,
        content_length_comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    fn metrics_with(extraction_time: f64, elements: usize, chars: usize) -> ExtractionMetrics {
        let mut m = metrics::compute(&[], "", extraction_time);
        m.num_elements = elements;
        m.character_count = chars;
        m
    }

    #[test]
    fn test_requires_two_results() {
        let m = metrics_with(1.0, 1, 1);
        let err = aggregate(&[(BackendKind::Docling, &m)]).unwrap_err();
        assert_eq!(err.0, 1);
        assert!(aggregate(&[]).is_err());
    }

    #[test]
    fn test_distinct_winners() {
        let docling = metrics_with(4.0, 10, 500);
        let mineru = metrics_with(2.0, 15, 300);

        let summary = aggregate(&[
            (BackendKind::Docling, &docling),
            (BackendKind::Mineru, &mineru),
        ])
        .unwrap();

        assert_eq!(summary.fastest_model, BackendKind::Mineru);
        assert_eq!(summary.most_elements_model, BackendKind::Mineru);
        assert_eq!(summary.longest_content_model, BackendKind::Docling);
        assert_eq!(summary.speed_comparison[&BackendKind::Docling], 4.0);
        assert_eq!(summary.element_comparison[&BackendKind::Mineru], 15);
        assert_eq!(summary.content_length_comparison[&BackendKind::Docling], 500);
    }

    #[test]
    fn test_exact_tie_goes_to_earliest_input() {
        let a = metrics_with(3.0, 5, 100);
        let b = metrics_with(3.0, 5, 100);

        let summary = aggregate(&[
            (BackendKind::Mineru, &a),
            (BackendKind::Docling, &b),
        ])
        .unwrap();
        assert_eq!(summary.fastest_model, BackendKind::Mineru);
        assert_eq!(summary.most_elements_model, BackendKind::Mineru);
        assert_eq!(summary.longest_content_model, BackendKind::Mineru);
    }

    #[test]
    fn test_tie_winner_follows_input_order_not_value_multiset() {
        let a = metrics_with(3.0, 5, 100);
        let b = metrics_with(3.0, 5, 100);

        let forward = aggregate(&[
            (BackendKind::Docling, &a),
            (BackendKind::Surya, &b),
        ])
        .unwrap();
        let reversed = aggregate(&[
            (BackendKind::Surya, &b),
            (BackendKind::Docling, &a),
        ])
        .unwrap();

        assert_eq!(forward.fastest_model, BackendKind::Docling);
        assert_eq!(reversed.fastest_model, BackendKind::Surya);
    }

    #[test]
    fn test_maps_cover_every_input() {
        let a = metrics_with(1.0, 1, 10);
        let b = metrics_with(2.0, 2, 20);
        let c = metrics_with(3.0, 3, 30);

        let summary = aggregate(&[
            (BackendKind::Docling, &a),
            (BackendKind::Mineru, &b),
            (BackendKind::Surya, &c),
        ])
        .unwrap();

        assert_eq!(summary.speed_comparison.len(), 3);
        assert_eq!(summary.element_comparison.len(), 3);
        assert_eq!(summary.content_length_comparison.len(), 3);
        assert_eq!(summary.fastest_model, BackendKind::Docling);
        assert_eq!(summary.most_elements_model, BackendKind::Surya);
        assert_eq!(summary.longest_content_model, BackendKind::Surya);
    }

    #[test]
    fn test_idempotent_over_same_inputs() {
        let a = metrics_with(2.5, 8, 80);
        let b = metrics_with(1.5, 12, 40);
        let inputs = [
            (BackendKind::Docling, &a),
            (BackendKind::Mineru, &b),
        ];

        let first = aggregate(&inputs).unwrap();
        let second = aggregate(&inputs).unwrap();
        assert_eq!(first.fastest_model, second.fastest_model);
        assert_eq!(first.speed_comparison, second.speed_comparison);
    }
}
