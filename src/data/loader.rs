//! Dataset loading

use crate::error::{Result, ShapboardError};
use polars::prelude::*;
use std::fs::File;

/// Loader for the tabular input dataset
pub struct DataLoader {
    /// Rows scanned to infer column dtypes
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
        }
    }

    /// Set the number of rows used for dtype inference
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = n;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: &str) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            ShapboardError::DataError(format!("cannot open dataset {}: {}", path, e))
        })?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file);

        let df = reader
            .finish()
            .map_err(|e| ShapboardError::DataError(e.to_string()))?;

        if df.height() == 0 {
            return Err(ShapboardError::DataError(format!(
                "dataset {} contains no rows",
                path
            )));
        }

        Ok(df)
    }
}
