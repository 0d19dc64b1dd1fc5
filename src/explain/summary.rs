//! Aggregate attribution summaries across a batch of records

use crate::error::{Result, ShapboardError};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Mean absolute attribution per feature over a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionSummary {
    pub feature_names: Vec<String>,
    /// Mean |phi| per feature, same order as `feature_names`
    pub mean_abs: Vec<f64>,
}

impl AttributionSummary {
    /// Aggregate over every record and every class
    pub fn across_classes(values: &Array3<f64>, feature_names: &[String]) -> Result<Self> {
        let (n_classes, n_records, n_features) = values.dim();
        Self::check_names(feature_names, n_features)?;

        let mut mean_abs = vec![0.0; n_features];
        for c in 0..n_classes {
            for i in 0..n_records {
                for f in 0..n_features {
                    mean_abs[f] += values[[c, i, f]].abs();
                }
            }
        }
        let denom = (n_classes * n_records).max(1) as f64;
        for v in &mut mean_abs {
            *v /= denom;
        }

        Ok(Self {
            feature_names: feature_names.to_vec(),
            mean_abs,
        })
    }

    /// Aggregate over every record for a single class
    pub fn for_class(values: &Array3<f64>, class: usize, feature_names: &[String]) -> Result<Self> {
        let (n_classes, n_records, n_features) = values.dim();
        Self::check_names(feature_names, n_features)?;
        if class >= n_classes {
            return Err(ShapboardError::ExplanationError(format!(
                "class {} out of range for {} classes",
                class, n_classes
            )));
        }

        let mut mean_abs = vec![0.0; n_features];
        for i in 0..n_records {
            for f in 0..n_features {
                mean_abs[f] += values[[class, i, f]].abs();
            }
        }
        let denom = n_records.max(1) as f64;
        for v in &mut mean_abs {
            *v /= denom;
        }

        Ok(Self {
            feature_names: feature_names.to_vec(),
            mean_abs,
        })
    }

    fn check_names(feature_names: &[String], n_features: usize) -> Result<()> {
        if feature_names.len() != n_features {
            return Err(ShapboardError::ShapeError {
                expected: format!("{} feature names", n_features),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        Ok(())
    }

    /// Feature indices ranked by mean absolute attribution, descending
    pub fn ranking(&self) -> Vec<(usize, f64)> {
        let mut indexed: Vec<(usize, f64)> = self.mean_abs.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_across_classes() {
        // 2 classes, 2 records, 2 features
        let mut values = Array3::zeros((2, 2, 2));
        values[[0, 0, 0]] = 0.5;
        values[[0, 1, 0]] = -0.5;
        values[[1, 0, 0]] = -0.5;
        values[[1, 1, 0]] = 0.5;
        values[[0, 0, 1]] = 0.1;

        let summary = AttributionSummary::across_classes(&values, &names(2)).unwrap();
        assert!((summary.mean_abs[0] - 0.5).abs() < 1e-12);
        assert!((summary.mean_abs[1] - 0.025).abs() < 1e-12);

        let ranking = summary.ranking();
        assert_eq!(ranking[0].0, 0);
    }

    #[test]
    fn test_for_class() {
        let mut values = Array3::zeros((2, 2, 2));
        values[[0, 0, 1]] = 1.0;
        values[[1, 0, 1]] = 3.0;

        let class0 = AttributionSummary::for_class(&values, 0, &names(2)).unwrap();
        assert!((class0.mean_abs[1] - 0.5).abs() < 1e-12);

        let class1 = AttributionSummary::for_class(&values, 1, &names(2)).unwrap();
        assert!((class1.mean_abs[1] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_class_out_of_range() {
        let values = Array3::zeros((2, 1, 1));
        assert!(AttributionSummary::for_class(&values, 5, &names(1)).is_err());
    }

    #[test]
    fn test_name_count_mismatch() {
        let values = Array3::zeros((2, 1, 3));
        assert!(AttributionSummary::across_classes(&values, &names(2)).is_err());
    }
}
