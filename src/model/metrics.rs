//! Classification quality metrics

use crate::error::{Result, ShapboardError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision/recall/F1 for one class (or one average)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class report with accuracy and macro/weighted averages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Indexed by class label
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

/// Compute the classification report over `n_classes` classes.
///
/// Precision and recall default to 0.0 for a class with no predicted or no
/// true members.
pub fn classification_report(
    y_true: &Array1<usize>,
    y_pred: &Array1<usize>,
    n_classes: usize,
) -> Result<ClassificationReport> {
    if y_true.len() != y_pred.len() {
        return Err(ShapboardError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(ShapboardError::ValidationError(
            "cannot compute metrics over zero records".to_string(),
        ));
    }
    if let Some(&bad) = y_true.iter().chain(y_pred.iter()).find(|&&c| c >= n_classes) {
        return Err(ShapboardError::ValidationError(format!(
            "class index {} out of range for {} classes",
            bad, n_classes
        )));
    }

    let n = y_true.len();
    let mut true_positives = vec![0usize; n_classes];
    let mut predicted = vec![0usize; n_classes];
    let mut actual = vec![0usize; n_classes];

    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        actual[t] += 1;
        predicted[p] += 1;
        if t == p {
            true_positives[t] += 1;
        }
    }

    let per_class: Vec<ClassMetrics> = (0..n_classes)
        .map(|c| {
            let precision = if predicted[c] > 0 {
                true_positives[c] as f64 / predicted[c] as f64
            } else {
                0.0
            };
            let recall = if actual[c] > 0 {
                true_positives[c] as f64 / actual[c] as f64
            } else {
                0.0
            };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                precision,
                recall,
                f1,
                support: actual[c],
            }
        })
        .collect();

    let accuracy = true_positives.iter().sum::<usize>() as f64 / n as f64;

    let k = n_classes as f64;
    let macro_avg = ClassMetrics {
        precision: per_class.iter().map(|m| m.precision).sum::<f64>() / k,
        recall: per_class.iter().map(|m| m.recall).sum::<f64>() / k,
        f1: per_class.iter().map(|m| m.f1).sum::<f64>() / k,
        support: n,
    };
    let weighted_avg = ClassMetrics {
        precision: per_class
            .iter()
            .map(|m| m.precision * m.support as f64)
            .sum::<f64>()
            / n as f64,
        recall: per_class
            .iter()
            .map(|m| m.recall * m.support as f64)
            .sum::<f64>()
            / n as f64,
        f1: per_class.iter().map(|m| m.f1 * m.support as f64).sum::<f64>() / n as f64,
        support: n,
    };

    Ok(ClassificationReport {
        per_class,
        accuracy,
        macro_avg,
        weighted_avg,
    })
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in self.per_class.iter().enumerate() {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        writeln!(
            f,
            "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            "macro avg",
            self.macro_avg.precision,
            self.macro_avg.recall,
            self.macro_avg.f1,
            self.macro_avg.support
        )?;
        write!(
            f,
            "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            "weighted avg",
            self.weighted_avg.precision,
            self.weighted_avg.recall,
            self.weighted_avg.f1,
            self.weighted_avg.support
        )
    }
}
