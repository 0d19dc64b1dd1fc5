//! Classification decision tree
//!
//! Every node stores the class distribution of the training rows that reach
//! it, not just the majority label. Leaves predict that distribution, and the
//! per-node distributions are what the decision-path attribution walks.

use crate::error::{Result, ShapboardError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Split criterion for growing the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitCriterion {
    Gini,
    Entropy,
}

/// Tree node carrying the class distribution of its training rows
#[derive(Debug, Clone)]
pub enum TreeNode {
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        distribution: Vec<f64>,
        n_samples: usize,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Class distribution of the training rows that reached this node
    pub fn distribution(&self) -> &[f64] {
        match self {
            TreeNode::Leaf { distribution, .. } => distribution,
            TreeNode::Split { distribution, .. } => distribution,
        }
    }
}

/// Decision tree classifier
#[derive(Debug, Clone)]
pub struct ClassificationTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; None means all
    pub max_features: Option<usize>,
    pub criterion: SplitCriterion,
    n_classes: usize,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl ClassificationTree {
    /// Create a new tree for `n_classes` classes
    pub fn new(n_classes: usize) -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: SplitCriterion::Gini,
            n_classes,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
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

    /// Set the number of features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Fit the tree. The rng drives per-split feature subsampling.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ShapboardError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ShapboardError::TrainingError(
                "cannot fit a tree on zero rows".to_string(),
            ));
        }
        if n_features == 0 {
            return Err(ShapboardError::TrainingError(
                "cannot fit a tree without feature columns".to_string(),
            ));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= self.n_classes) {
            return Err(ShapboardError::TrainingError(format!(
                "class index {} out of range for {} classes",
                bad, self.n_classes
            )));
        }

        self.n_features = n_features;

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_node(x, y, &indices, 0, rng, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(y, indices);
        let distribution = Self::to_distribution(&counts, n_samples);

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.max_depth.map_or(false, |d| depth >= d);
        if n_samples < self.min_samples_split || is_pure || depth_reached {
            return TreeNode::Leaf {
                distribution,
                n_samples,
            };
        }

        let candidates = self.candidate_features(rng);
        let best = self.find_best_split(x, y, indices, &counts, &candidates);

        if let Some((feature_idx, threshold, gain)) = best {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, feature_idx]] <= threshold);

            if left_indices.len() < self.min_samples_leaf
                || right_indices.len() < self.min_samples_leaf
            {
                return TreeNode::Leaf {
                    distribution,
                    n_samples,
                };
            }

            importances[feature_idx] += n_samples as f64 * gain;

            let left = Box::new(self.build_node(x, y, &left_indices, depth + 1, rng, importances));
            let right =
                Box::new(self.build_node(x, y, &right_indices, depth + 1, rng, importances));

            TreeNode::Split {
                feature_idx,
                threshold,
                distribution,
                n_samples,
                left,
                right,
            }
        } else {
            TreeNode::Leaf {
                distribution,
                n_samples,
            }
        }
    }

    /// Features to consider at one split, sampled without replacement
    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let k = self
            .max_features
            .unwrap_or(self.n_features)
            .clamp(1, self.n_features);
        if k == self.n_features {
            return (0..self.n_features).collect();
        }
        let mut all: Vec<usize> = (0..self.n_features).collect();
        all.shuffle(rng);
        all.truncate(k);
        all
    }

    /// Scan candidate features for the split with the largest impurity decrease.
    ///
    /// Each feature is swept once over its sorted values with incremental
    /// class counts, so a feature scan is O(n log n) rather than O(n) per
    /// threshold. Features scan in parallel; the best result wins.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        indices: &[usize],
        parent_counts: &[usize],
        candidates: &[usize],
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len();
        let parent_impurity = self.impurity(parent_counts, n);

        let results: Vec<Option<(usize, f64, f64)>> = candidates
            .par_iter()
            .map(|&feature_idx| {
                let mut order: Vec<usize> = indices.to_vec();
                order.sort_by(|&a, &b| {
                    x[[a, feature_idx]]
                        .partial_cmp(&x[[b, feature_idx]])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                let mut left_counts = vec![0usize; self.n_classes];
                let mut right_counts = parent_counts.to_vec();
                let mut best: Option<(f64, f64)> = None;

                for pos in 0..n - 1 {
                    let idx = order[pos];
                    left_counts[y[idx]] += 1;
                    right_counts[y[idx]] -= 1;

                    let v = x[[idx, feature_idx]];
                    let v_next = x[[order[pos + 1], feature_idx]];
                    if v == v_next {
                        continue;
                    }

                    let n_left = pos + 1;
                    let n_right = n - n_left;
                    if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                        continue;
                    }

                    let weighted = (n_left as f64 * self.impurity(&left_counts, n_left)
                        + n_right as f64 * self.impurity(&right_counts, n_right))
                        / n as f64;
                    let gain = parent_impurity - weighted;

                    if gain > 0.0 && best.map_or(true, |(_, g)| gain > g) {
                        best = Some(((v + v_next) / 2.0, gain));
                    }
                }

                best.map(|(threshold, gain)| (feature_idx, threshold, gain))
            })
            .collect();

        results
            .into_iter()
            .flatten()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
    }

    fn class_counts(&self, y: &Array1<usize>, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    fn to_distribution(counts: &[usize], n_samples: usize) -> Vec<f64> {
        counts
            .iter()
            .map(|&c| c as f64 / n_samples as f64)
            .collect()
    }

    fn impurity(&self, counts: &[usize], n_samples: usize) -> f64 {
        if n_samples == 0 {
            return 0.0;
        }
        let n = n_samples as f64;
        match self.criterion {
            SplitCriterion::Gini => {
                let sum_sq: f64 = counts.iter().map(|&c| (c as f64 / n).powi(2)).sum();
                1.0 - sum_sq
            }
            SplitCriterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }

    /// Class distribution predicted for one row (the reached leaf's)
    pub fn distribution_for(&self, row: ArrayView1<f64>) -> Result<&[f64]> {
        let mut node = self.root.as_ref().ok_or(ShapboardError::ModelNotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Root node, if fitted
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Number of classes this tree predicts over
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Impurity-decrease feature importances, normalized to sum to one
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Depth of the fitted tree
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_separable_data() {
        let x = array![[0.0, 1.0], [0.1, 0.9], [0.2, 0.8], [1.0, 0.2], [1.1, 0.1], [1.2, 0.0]];
        let y = array![0, 0, 0, 1, 1, 1];

        let mut tree = ClassificationTree::new(2);
        tree.fit(&x, &y, &mut rng()).unwrap();

        for (i, &label) in y.iter().enumerate() {
            let dist = tree.distribution_for(x.row(i)).unwrap();
            assert!(dist[label] > 0.5, "row {} misclassified: {:?}", i, dist);
        }
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![0, 0, 1, 0, 1, 1];

        let mut tree = ClassificationTree::new(2).with_max_depth(2);
        tree.fit(&x, &y, &mut rng()).unwrap();

        for i in 0..x.nrows() {
            let dist = tree.distribution_for(x.row(i)).unwrap();
            let sum: f64 = dist.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_max_depth_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![0, 1, 0, 1, 0, 1, 0, 1];

        let mut tree = ClassificationTree::new(2).with_max_depth(2);
        tree.fit(&x, &y, &mut rng()).unwrap();
        assert!(tree.depth() <= 3); // root split + one level + leaves
    }

    #[test]
    fn test_pure_node_becomes_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1, 1, 1];

        let mut tree = ClassificationTree::new(2);
        tree.fit(&x, &y, &mut rng()).unwrap();
        assert_eq!(tree.depth(), 1);
        let dist = tree.distribution_for(x.row(0)).unwrap();
        assert_eq!(dist, &[0.0, 1.0]);
    }

    #[test]
    fn test_class_index_out_of_range() {
        let x = array![[1.0], [2.0]];
        let y = array![0, 5];
        let mut tree = ClassificationTree::new(2);
        assert!(tree.fit(&x, &y, &mut rng()).is_err());
    }

    #[test]
    fn test_feature_importances_prefer_informative_feature() {
        let x = array![
            [1.0, 7.0],
            [2.0, 7.0],
            [3.0, 7.0],
            [4.0, 7.0],
            [5.0, 7.0],
            [6.0, 7.0]
        ];
        let y = array![0, 0, 0, 1, 1, 1];

        let mut tree = ClassificationTree::new(2);
        tree.fit(&x, &y, &mut rng()).unwrap();
        let importances = tree.feature_importances().unwrap();
        assert!(importances[0] > importances[1]);
    }
}
