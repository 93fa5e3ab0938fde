//! Shared utilities

mod data_loader;

pub use data_loader::{rename_column, DataLoader};

use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Extract all columns of a frame into a row-major `Array2<f64>`.
///
/// Columns are cast to `Float64`; remaining nulls become 0.0 (preprocessing
/// is expected to have imputed them already).
pub fn to_feature_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = df.width();

    let col_data: Vec<Vec<f64>> = df
        .get_columns()
        .iter()
        .map(|col| {
            let series_f64 = col
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| BenchError::Data(e.to_string()))?;
            let values: Vec<f64> = series_f64
                .f64()
                .map_err(|e| BenchError::Data(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Extract a single-column frame into an `Array1<f64>`.
pub fn to_target_vector(df: &DataFrame) -> Result<Array1<f64>> {
    if df.width() != 1 {
        return Err(BenchError::Data(format!(
            "expected a single target column, got {}",
            df.width()
        )));
    }
    let matrix = to_feature_matrix(df)?;
    Ok(matrix.column(0).to_owned())
}
