//! Schema descriptor derived once at load time
//!
//! Both the batch encoder and the interactive input path consult this
//! descriptor, so a categorical value outside the observed domain is caught
//! here instead of silently producing a misaligned feature vector.

use crate::error::{Result, ShapboardError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Continuous or integer-valued column, used as-is
    Numeric,
    /// String-valued column with the domain observed at load time, sorted
    Categorical { categories: Vec<String> },
}

/// One feature column of the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

/// Ordered schema of the feature columns plus the target column name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub target: String,
    pub features: Vec<FeatureSpec>,
}

impl TableSchema {
    /// Derive the schema from a loaded DataFrame.
    ///
    /// The target column must exist and is excluded from the feature list.
    /// Column order follows the DataFrame.
    pub fn from_dataframe(df: &DataFrame, target: &str) -> Result<Self> {
        if df.column(target).is_err() {
            return Err(ShapboardError::SchemaError(format!(
                "target column '{}' not found in dataset",
                target
            )));
        }

        let mut features = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            if name == target {
                continue;
            }

            let kind = match col.dtype() {
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64 => FeatureKind::Numeric,
                DataType::String => {
                    let series = col.as_materialized_series();
                    let ca = series
                        .str()
                        .map_err(|e| ShapboardError::DataError(e.to_string()))?;
                    let mut categories: Vec<String> = ca
                        .unique()
                        .map_err(|e| ShapboardError::DataError(e.to_string()))?
                        .into_iter()
                        .filter_map(|s| s.map(|s| s.to_string()))
                        .collect();
                    categories.sort();
                    if categories.is_empty() {
                        return Err(ShapboardError::SchemaError(format!(
                            "categorical column '{}' has no observed values",
                            name
                        )));
                    }
                    FeatureKind::Categorical { categories }
                }
                other => {
                    return Err(ShapboardError::SchemaError(format!(
                        "unsupported dtype {:?} for column '{}'",
                        other, name
                    )));
                }
            };

            features.push(FeatureSpec { name, kind });
        }

        if features.is_empty() {
            return Err(ShapboardError::SchemaError(
                "dataset has no feature columns besides the target".to_string(),
            ));
        }

        Ok(Self {
            target: target.to_string(),
            features,
        })
    }

    /// Look up a feature by name
    pub fn feature(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Number of original (pre-encoding) feature columns
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Extract the target column as class indices.
    ///
    /// The target must be numeric with values 0 and 1.
    pub fn target_values(&self, df: &DataFrame) -> Result<Vec<usize>> {
        let col = df
            .column(&self.target)
            .map_err(|_| ShapboardError::FeatureNotFound(self.target.clone()))?;
        let series = col
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| ShapboardError::DataError(e.to_string()))?;
        let ca = series
            .f64()
            .map_err(|e| ShapboardError::DataError(e.to_string()))?;

        let mut values = Vec::with_capacity(df.height());
        for (i, v) in ca.into_iter().enumerate() {
            let v = v.ok_or_else(|| {
                ShapboardError::DataError(format!(
                    "null target value in row {} of column '{}'",
                    i, self.target
                ))
            })?;
            let label = v.round();
            if (label - v).abs() > 1e-9 || !(label == 0.0 || label == 1.0) {
                return Err(ShapboardError::DataError(format!(
                    "target column '{}' must be binary 0/1, found {} in row {}",
                    self.target, v, i
                )));
            }
            values.push(label as usize);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "Age" => &[54i64, 47, 62, 39],
            "Sex" => &["M", "F", "M", "M"],
            "HeartDisease" => &[1i64, 0, 1, 0],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_derivation() {
        let schema = TableSchema::from_dataframe(&sample_df(), "HeartDisease").unwrap();
        assert_eq!(schema.n_features(), 2);
        assert_eq!(schema.features[0].name, "Age");
        assert_eq!(schema.features[0].kind, FeatureKind::Numeric);
        match &schema.features[1].kind {
            FeatureKind::Categorical { categories } => {
                assert_eq!(categories, &vec!["F".to_string(), "M".to_string()]);
            }
            other => panic!("expected categorical, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_target() {
        let result = TableSchema::from_dataframe(&sample_df(), "Outcome");
        assert!(matches!(result, Err(ShapboardError::SchemaError(_))));
    }

    #[test]
    fn test_target_values() {
        let schema = TableSchema::from_dataframe(&sample_df(), "HeartDisease").unwrap();
        let y = schema.target_values(&sample_df()).unwrap();
        assert_eq!(y, vec![1, 0, 1, 0]);
    }

    #[test]
    fn test_non_binary_target_rejected() {
        let df = df!(
            "Age" => &[54i64, 47],
            "HeartDisease" => &[2i64, 0],
        )
        .unwrap();
        let schema = TableSchema::from_dataframe(&df, "HeartDisease").unwrap();
        assert!(schema.target_values(&df).is_err());
    }
}
