//! Model training and evaluation
//!
//! A random forest of classification trees whose nodes carry the full class
//! distribution of the training rows reaching them. The distributions drive
//! soft-voting probability estimates and the decision-path attributions in
//! [`crate::explain`].

mod forest;
mod metrics;
mod tree;

pub use forest::{MaxFeatures, RandomForestClassifier};
pub use metrics::{classification_report, ClassMetrics, ClassificationReport};
pub use tree::{ClassificationTree, SplitCriterion, TreeNode};
