//! Feature attribution for the fitted forest
//!
//! Attributions are decision-path contributions: walking a record down each
//! tree, every split moves the node's class distribution by some amount, and
//! that movement is credited to the split feature. Summed over a path the
//! movements telescope, so baseline plus attributions reproduces the model's
//! output exactly.

mod summary;
mod tree_explainer;

pub use summary::AttributionSummary;
pub use tree_explainer::TreeExplainer;
