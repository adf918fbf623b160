//! Held-out evaluation metrics for the trained classifier.
//!
//! Mirrors the diagnostics the training run reports: overall accuracy,
//! a per-class precision/recall/F1 breakdown, and feature importance
//! pairs. All types serialize for the CLI's `--json` report.

use serde::{Deserialize, Serialize};

/// Precision/recall/F1 for a single fertilizer class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    /// Fertilizer name (decoded label).
    pub label: String,
    /// Fraction of predictions for this class that were correct.
    pub precision: f64,
    /// Fraction of true members of this class that were found.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of held-out samples with this true label.
    pub support: usize,
}

/// Fraction of correct predictions.
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}

/// Per-class precision/recall/F1 over held-out predictions.
///
/// `labels[c]` is the display name for class code `c`. Classes with no
/// held-out support and no predictions report zeros rather than NaN.
pub fn classification_report(
    truth: &[usize],
    predicted: &[usize],
    labels: &[String],
) -> Vec<ClassReport> {
    let n_classes = labels.len();
    let mut true_positives = vec![0usize; n_classes];
    let mut predicted_counts = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];

    for (&t, &p) in truth.iter().zip(predicted) {
        support[t] += 1;
        predicted_counts[p] += 1;
        if t == p {
            true_positives[t] += 1;
        }
    }

    labels
        .iter()
        .enumerate()
        .map(|(c, label)| {
            let precision = ratio(true_positives[c], predicted_counts[c]);
            let recall = ratio(true_positives[c], support[c]);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassReport {
                label: label.clone(),
                precision,
                recall,
                f1,
                support: support[c],
            }
        })
        .collect()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_classification_report_perfect() {
        let labels = vec!["DAP".to_string(), "Urea".to_string()];
        let report = classification_report(&[0, 1, 0], &[0, 1, 0], &labels);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].precision, 1.0);
        assert_eq!(report[0].recall, 1.0);
        assert_eq!(report[0].f1, 1.0);
        assert_eq!(report[0].support, 2);
    }

    #[test]
    fn test_classification_report_no_support_is_zero_not_nan() {
        let labels = vec!["DAP".to_string(), "Urea".to_string(), "28-28".to_string()];
        let report = classification_report(&[0, 0], &[0, 1], &labels);
        let unseen = &report[2];
        assert_eq!(unseen.precision, 0.0);
        assert_eq!(unseen.recall, 0.0);
        assert_eq!(unseen.f1, 0.0);
        assert_eq!(unseen.support, 0);
    }

    #[test]
    fn test_classification_report_mixed() {
        let labels = vec!["a".to_string(), "b".to_string()];
        // class 0: tp=1, predicted twice, support twice
        let report = classification_report(&[0, 0, 1], &[0, 1, 0], &labels);
        assert_eq!(report[0].precision, 0.5);
        assert_eq!(report[0].recall, 0.5);
        assert_eq!(report[0].f1, 0.5);
    }
}
