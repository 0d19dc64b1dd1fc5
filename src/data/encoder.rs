//! One-hot encoding with a fixed column layout
//!
//! The layout is: numeric features in schema order first, then one indicator
//! column per non-reference category of each categorical feature. The first
//! category in sorted order is the dropped reference, so a record of all-zero
//! indicators encodes the reference category unambiguously.

use super::schema::{FeatureKind, TableSchema};
use crate::error::{Result, ShapboardError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One encoded output column
#[derive(Debug, Clone, Serialize, Deserialize)]
enum EncodedColumn {
    Numeric { feature: String },
    Indicator { feature: String, category: String },
}

impl EncodedColumn {
    fn name(&self) -> String {
        match self {
            EncodedColumn::Numeric { feature } => feature.clone(),
            EncodedColumn::Indicator { feature, category } => {
                format!("{}_{}", feature, category)
            }
        }
    }
}

/// A single value of an interactive input record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

/// One interactive input record, keyed by original feature name
pub type InputRecord = HashMap<String, FeatureValue>;

/// Encoder mapping original feature columns onto the numeric matrix layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<EncodedColumn>,
}

impl OneHotEncoder {
    /// Build the encoder from a schema. The layout is fixed from here on.
    pub fn from_schema(schema: &TableSchema) -> Self {
        let mut columns = Vec::new();

        for spec in &schema.features {
            if spec.kind == FeatureKind::Numeric {
                columns.push(EncodedColumn::Numeric {
                    feature: spec.name.clone(),
                });
            }
        }
        for spec in &schema.features {
            if let FeatureKind::Categorical { categories } = &spec.kind {
                // Skip the first sorted category: it is the reference level.
                for category in categories.iter().skip(1) {
                    columns.push(EncodedColumn::Indicator {
                        feature: spec.name.clone(),
                        category: category.clone(),
                    });
                }
            }
        }

        Self { columns }
    }

    /// Names of the encoded columns, in matrix order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Number of encoded columns
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Encode a full DataFrame into the feature matrix
    pub fn encode_frame(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let n_rows = df.height();
        let mut matrix = Array2::zeros((n_rows, self.columns.len()));

        for (j, column) in self.columns.iter().enumerate() {
            match column {
                EncodedColumn::Numeric { feature } => {
                    let col = df
                        .column(feature)
                        .map_err(|_| ShapboardError::FeatureNotFound(feature.clone()))?;
                    let series = col
                        .as_materialized_series()
                        .cast(&DataType::Float64)
                        .map_err(|e| ShapboardError::DataError(e.to_string()))?;
                    let ca = series
                        .f64()
                        .map_err(|e| ShapboardError::DataError(e.to_string()))?;
                    for (i, v) in ca.into_iter().enumerate() {
                        matrix[[i, j]] = v.ok_or_else(|| {
                            ShapboardError::DataError(format!(
                                "null value in numeric column '{}' row {}",
                                feature, i
                            ))
                        })?;
                    }
                }
                EncodedColumn::Indicator { feature, category } => {
                    let col = df
                        .column(feature)
                        .map_err(|_| ShapboardError::FeatureNotFound(feature.clone()))?;
                    let series = col.as_materialized_series();
                    let ca = series
                        .str()
                        .map_err(|e| ShapboardError::DataError(e.to_string()))?;
                    for (i, v) in ca.into_iter().enumerate() {
                        let v = v.ok_or_else(|| {
                            ShapboardError::DataError(format!(
                                "null value in categorical column '{}' row {}",
                                feature, i
                            ))
                        })?;
                        if v == category {
                            matrix[[i, j]] = 1.0;
                        }
                    }
                }
            }
        }

        Ok(matrix)
    }

    /// Validate and encode one interactive input record.
    ///
    /// Every schema feature must be present with a value of the right kind;
    /// categorical values outside the observed domain are rejected.
    pub fn encode_record(&self, schema: &TableSchema, record: &InputRecord) -> Result<Array1<f64>> {
        for name in record.keys() {
            if schema.feature(name).is_none() {
                return Err(ShapboardError::ValidationError(format!(
                    "unknown feature '{}' in input record",
                    name
                )));
            }
        }

        for spec in &schema.features {
            let value = record.get(&spec.name).ok_or_else(|| {
                ShapboardError::ValidationError(format!(
                    "input record is missing feature '{}'",
                    spec.name
                ))
            })?;
            match (&spec.kind, value) {
                (FeatureKind::Numeric, FeatureValue::Number(_)) => {}
                (FeatureKind::Numeric, FeatureValue::Category(v)) => {
                    return Err(ShapboardError::ValidationError(format!(
                        "feature '{}' expects a number, got '{}'",
                        spec.name, v
                    )));
                }
                (FeatureKind::Categorical { categories }, FeatureValue::Category(v)) => {
                    if !categories.contains(v) {
                        return Err(ShapboardError::ValidationError(format!(
                            "value '{}' for feature '{}' was never observed in the dataset",
                            v, spec.name
                        )));
                    }
                }
                (FeatureKind::Categorical { .. }, FeatureValue::Number(v)) => {
                    return Err(ShapboardError::ValidationError(format!(
                        "feature '{}' expects a category, got {}",
                        spec.name, v
                    )));
                }
            }
        }

        let mut row = Array1::zeros(self.columns.len());
        for (j, column) in self.columns.iter().enumerate() {
            match column {
                EncodedColumn::Numeric { feature } => {
                    if let Some(FeatureValue::Number(v)) = record.get(feature) {
                        row[j] = *v;
                    }
                }
                EncodedColumn::Indicator { feature, category } => {
                    if let Some(FeatureValue::Category(v)) = record.get(feature) {
                        if v == category {
                            row[j] = 1.0;
                        }
                    }
                }
            }
        }

        Ok(row)
    }
}
