//! Data loading, schema derivation and encoding
//!
//! The schema descriptor is derived exactly once from the loaded dataset and
//! is the single source of truth for both the batch encoding path and the
//! interactive input path, so their column layouts cannot drift apart.

mod encoder;
mod loader;
mod schema;
mod split;

pub use encoder::{FeatureValue, InputRecord, OneHotEncoder};
pub use loader::DataLoader;
pub use schema::{FeatureKind, FeatureSpec, TableSchema};
pub use split::{train_eval_split, SplitIndices};
