//! Column-type selection

use crate::error::{BenchError, Result};
use super::ColumnType;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Selects the sub-frame of columns matching a scalar type.
///
/// Row order and column order are preserved. Selection is stateless, so
/// `fit` is a no-op and `transform` can be called at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtypeSelector {
    dtype: ColumnType,
}

impl DtypeSelector {
    pub fn new(dtype: ColumnType) -> Self {
        Self { dtype }
    }

    /// Return a new frame containing only the matching columns.
    ///
    /// Fails with a data error when nothing matches; callers are expected
    /// to check column counts before adding this step to a branch.
    pub fn select(&self, df: &DataFrame) -> Result<DataFrame> {
        let columns: Vec<Column> = df
            .get_columns()
            .iter()
            .filter(|col| ColumnType::of(col.dtype()) == Some(self.dtype))
            .cloned()
            .collect();

        if columns.is_empty() {
            return Err(BenchError::Data(format!(
                "no {:?} columns to select",
                self.dtype
            )));
        }

        DataFrame::new(columns).map_err(|e| BenchError::Data(e.to_string()))
    }

    pub fn dtype(&self) -> ColumnType {
        self.dtype
    }
}
