//! Random forest classifier
//!
//! Bootstrap-sampled trees built in parallel, each seeded from the forest's
//! random state so a fit is reproducible. Probabilities are soft votes: the
//! mean of the per-tree leaf distributions.

use super::tree::{ClassificationTree, SplitCriterion};
use crate::error::{Result, ShapboardError};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Strategy for the number of features considered per split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// Square root of the feature count (the classification default)
    Sqrt,
    /// All features
    All,
    /// Fixed number
    Fixed(usize),
}

/// Random forest model
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    trees: Vec<ClassificationTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub criterion: SplitCriterion,
    pub random_state: u64,
    n_classes: usize,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestClassifier {
    /// Create a forest with `n_estimators` trees and default hyperparameters
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            criterion: SplitCriterion::Gini,
            random_state: 42,
            n_classes: 0,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    fn features_per_split(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(n) => n.min(n_features),
        }
        .max(1)
    }

    /// Fit the forest to class-indexed labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ShapboardError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(ShapboardError::TrainingError(
                "cannot fit on an empty matrix".to_string(),
            ));
        }

        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        if n_classes < 2 {
            return Err(ShapboardError::TrainingError(
                "training labels contain fewer than two classes".to_string(),
            ));
        }

        self.n_classes = n_classes;
        self.n_features = n_features;
        let max_features = self.features_per_split(n_features);

        let trees: Vec<ClassificationTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<ClassificationTree> {
                let seed = self.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<usize> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = ClassificationTree::new(n_classes)
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_criterion(self.criterion);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit(&x_boot, &y_boot, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (i, &val) in imp.iter().enumerate() {
                    total[i] += val;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        for imp in &mut total {
            *imp /= n_trees;
        }
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for imp in &mut total {
                *imp /= sum;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total));
    }

    /// Per-class probabilities, averaged over the trees' leaf distributions
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(ShapboardError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ShapboardError::ShapeError {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let n_samples = x.nrows();
        let mut proba = Array2::zeros((n_samples, self.n_classes));

        for i in 0..n_samples {
            let row = x.row(i);
            for tree in &self.trees {
                let dist = tree.distribution_for(row)?;
                for (j, &p) in dist.iter().enumerate() {
                    proba[[i, j]] += p;
                }
            }
        }
        proba /= self.trees.len() as f64;

        Ok(proba)
    }

    /// Predicted class labels (argmax of the averaged distribution)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        let labels: Vec<usize> = proba
            .rows()
            .into_iter()
            .map(|row| {
                // First maximum wins, so an exact tie resolves to the lower class.
                let mut best = 0;
                for (idx, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = idx;
                    }
                }
                best
            })
            .collect();
        Ok(Array1::from_vec(labels))
    }

    /// The fitted trees
    pub fn trees(&self) -> &[ClassificationTree] {
        &self.trees
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of feature columns the forest was fitted on
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Whether fit has completed
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Mean impurity-decrease feature importances, normalized
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<usize>) {
        (
            array![
                [0.0, 0.0],
                [0.1, 0.1],
                [0.2, 0.2],
                [0.3, 0.1],
                [1.0, 1.0],
                [1.1, 1.1],
                [1.2, 1.2],
                [1.3, 1.1]
            ],
            array![0, 0, 0, 0, 1, 1, 1, 1],
        )
    }

    #[test]
    fn test_fit_predict() {
        let (x, y) = separable();
        let mut rf = RandomForestClassifier::new(20).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| p == a)
            .count();
        assert!(correct >= 7, "only {} of 8 correct", correct);
    }

    #[test]
    fn test_proba_rows_sum_to_one() {
        let (x, y) = separable();
        let mut rf = RandomForestClassifier::new(10).with_random_state(7);
        rf.fit(&x, &y).unwrap();

        let proba = rf.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (8, 2));
        for row in proba.rows() {
            let sum: f64 = row.sum();
            assert!((sum - 1.0).abs() < 1e-9);
            for &p in row {
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn test_fit_is_reproducible() {
        let (x, y) = separable();
        let mut a = RandomForestClassifier::new(15).with_random_state(3);
        let mut b = RandomForestClassifier::new(15).with_random_state(3);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let pa = a.predict_proba(&x).unwrap();
        let pb = b.predict_proba(&x).unwrap();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_label_matches_threshold() {
        let (x, y) = separable();
        let mut rf = RandomForestClassifier::new(25).with_random_state(9);
        rf.fit(&x, &y).unwrap();

        let proba = rf.predict_proba(&x).unwrap();
        let labels = rf.predict(&x).unwrap();
        for i in 0..x.nrows() {
            if proba[[i, 1]] > 0.5 {
                assert_eq!(labels[i], 1);
            } else if proba[[i, 1]] < 0.5 {
                assert_eq!(labels[i], 0);
            }
        }
    }

    #[test]
    fn test_unfitted_predict_errors() {
        let rf = RandomForestClassifier::new(5);
        let x = array![[0.0, 1.0]];
        assert!(matches!(
            rf.predict(&x),
            Err(ShapboardError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![0, 0];
        let mut rf = RandomForestClassifier::new(5);
        assert!(rf.fit(&x, &y).is_err());
    }
}
