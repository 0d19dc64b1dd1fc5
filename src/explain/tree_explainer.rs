//! Decision-path attribution over a fitted forest

use crate::error::{Result, ShapboardError};
use crate::model::{RandomForestClassifier, TreeNode};
use ndarray::{Array2, Array3, ArrayView1};

/// Explainer computing per-feature attribution values for forest predictions.
///
/// For one tree, the attribution of a record walks the root-to-leaf path: a
/// split on feature `f` that moves the class distribution from `parent` to
/// `child` adds `child[c] - parent[c]` to `phi[f][c]`. The walk telescopes,
/// so `root[c] + sum_f phi[f][c] = leaf[c]`. Averaged over trees this gives
///
/// `expected_value[c] + sum_f phi[f][c] = predict_proba[c]`
///
/// with equality up to floating-point rounding.
pub struct TreeExplainer<'a> {
    forest: &'a RandomForestClassifier,
    expected_value: Vec<f64>,
}

impl<'a> TreeExplainer<'a> {
    /// Build an explainer for a fitted forest
    pub fn new(forest: &'a RandomForestClassifier) -> Result<Self> {
        if !forest.is_fitted() {
            return Err(ShapboardError::ModelNotFitted);
        }

        let n_classes = forest.n_classes();
        let mut expected_value = vec![0.0; n_classes];
        for tree in forest.trees() {
            let root = tree
                .root()
                .ok_or(ShapboardError::ModelNotFitted)?
                .distribution();
            for (c, &p) in root.iter().enumerate() {
                expected_value[c] += p;
            }
        }
        let n_trees = forest.trees().len() as f64;
        for v in &mut expected_value {
            *v /= n_trees;
        }

        Ok(Self {
            forest,
            expected_value,
        })
    }

    /// Baseline expected output per class (mean of the trees' root distributions)
    pub fn expected_value(&self) -> &[f64] {
        &self.expected_value
    }

    /// Attribution values for one record, shaped `(n_classes, n_features)`
    pub fn explain_record(&self, row: ArrayView1<f64>) -> Result<Array2<f64>> {
        if row.len() != self.forest.n_features() {
            return Err(ShapboardError::ShapeError {
                expected: format!("{} feature columns", self.forest.n_features()),
                actual: format!("{} feature columns", row.len()),
            });
        }

        let n_classes = self.forest.n_classes();
        let n_features = self.forest.n_features();
        let mut phi = Array2::zeros((n_classes, n_features));

        for tree in self.forest.trees() {
            let mut node = tree.root().ok_or(ShapboardError::ModelNotFitted)?;
            while let TreeNode::Split {
                feature_idx,
                threshold,
                distribution,
                left,
                right,
                ..
            } = node
            {
                let child: &TreeNode = if row[*feature_idx] <= *threshold {
                    left
                } else {
                    right
                };
                let child_dist = child.distribution();
                for c in 0..n_classes {
                    phi[[c, *feature_idx]] += child_dist[c] - distribution[c];
                }
                node = child;
            }
        }

        phi /= self.forest.trees().len() as f64;
        Ok(phi)
    }

    /// Attribution values for a batch, shaped `(n_classes, n_records, n_features)`
    pub fn shap_values(&self, x: &Array2<f64>) -> Result<Array3<f64>> {
        let n_classes = self.forest.n_classes();
        let mut values = Array3::zeros((n_classes, x.nrows(), x.ncols()));

        for (i, row) in x.rows().into_iter().enumerate() {
            let phi = self.explain_record(row)?;
            for c in 0..n_classes {
                for f in 0..x.ncols() {
                    values[[c, i, f]] = phi[[c, f]];
                }
            }
        }

        Ok(values)
    }
}
