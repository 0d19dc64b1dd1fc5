//! Pipeline configuration
//!
//! Defaults mirror the dashboard's fixed setup: a heart-failure dataset with a
//! binary `HeartDisease` target, a seeded 70/30 split and a 100-tree forest.
//! Every field can be overridden through environment variables.

use crate::error::{Result, ShapboardError};

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to the CSV dataset
    pub data_path: String,
    /// Name of the binary target column
    pub target: String,
    /// Seed for the train/evaluation split and forest bootstrap
    pub seed: u64,
    /// Fraction of rows held out for evaluation
    pub eval_fraction: f64,
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum tree depth (None grows trees until pure)
    pub max_depth: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: std::env::var("DATA_PATH").unwrap_or_else(|_| "data/heart.csv".to_string()),
            target: std::env::var("TARGET_COLUMN").unwrap_or_else(|_| "HeartDisease".to_string()),
            seed: std::env::var("SPLIT_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            eval_fraction: std::env::var("EVAL_FRACTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.3),
            n_trees: std::env::var("N_TREES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            max_depth: std::env::var("MAX_DEPTH").ok().and_then(|s| s.parse().ok()),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration before running the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.target.is_empty() {
            return Err(ShapboardError::InvalidParameter {
                name: "target".to_string(),
                value: String::new(),
                reason: "target column name must not be empty".to_string(),
            });
        }
        if !(self.eval_fraction > 0.0 && self.eval_fraction < 1.0) {
            return Err(ShapboardError::InvalidParameter {
                name: "eval_fraction".to_string(),
                value: self.eval_fraction.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }
        if self.n_trees == 0 {
            return Err(ShapboardError::InvalidParameter {
                name: "n_trees".to_string(),
                value: "0".to_string(),
                reason: "the forest needs at least one tree".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target, "HeartDisease");
        assert!((config.eval_fraction - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_eval_fraction() {
        let config = PipelineConfig {
            eval_fraction: 1.5,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
