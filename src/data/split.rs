//! Deterministic train/evaluation split

use crate::error::{Result, ShapboardError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of the two disjoint partitions
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub eval: Vec<usize>,
}

/// Split `n_rows` rows into disjoint train and evaluation partitions.
///
/// The shuffle is seeded, so the same seed and row count always produce the
/// same membership. The evaluation partition holds `ceil(n_rows * eval_fraction)`
/// rows; both partitions keep their indices in ascending order.
pub fn train_eval_split(n_rows: usize, eval_fraction: f64, seed: u64) -> Result<SplitIndices> {
    if !(eval_fraction > 0.0 && eval_fraction < 1.0) {
        return Err(ShapboardError::InvalidParameter {
            name: "eval_fraction".to_string(),
            value: eval_fraction.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }
    if n_rows < 2 {
        return Err(ShapboardError::DataError(format!(
            "need at least 2 rows to split, got {}",
            n_rows
        )));
    }

    let n_eval = ((n_rows as f64 * eval_fraction).ceil() as usize).clamp(1, n_rows - 1);

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut eval: Vec<usize> = indices[..n_eval].to_vec();
    let mut train: Vec<usize> = indices[n_eval..].to_vec();
    eval.sort_unstable();
    train.sort_unstable();

    Ok(SplitIndices { train, eval })
}
