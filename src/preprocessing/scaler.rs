//! Feature scaling

use crate::error::{BenchError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
}

impl FromStr for ScalerType {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SS" | "standard" => Ok(ScalerType::Standard),
            "MM" | "minmax" => Ok(ScalerType::MinMax),
            other => Err(BenchError::Configuration(format!(
                "unknown scaler kind: {other}"
            ))),
        }
    }
}

/// Parameters for a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Feature scaler over all columns of a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: BTreeMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.params.clear();

        for col in df.get_columns() {
            let name = col.name().to_string();
            let series = col.as_materialized_series();
            let params = self.compute_params(series)?;
            self.params.insert(name, params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data.
    /// Builds all replacement columns first, then assembles one new frame.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BenchError::NotFitted);
        }

        let columns: Vec<Column> = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                match self.params.get(col.name().as_str()) {
                    Some(params) => self.scale_series(series, params).map(Column::from),
                    None => Ok(col.clone()),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        DataFrame::new(columns).map_err(|e| BenchError::Data(e.to_string()))
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    fn compute_params(&self, series: &Series) -> Result<ScalerParams> {
        let ca = Self::as_f64(series)?;

        match self.scaler_type {
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(1).unwrap_or(1.0);
                Ok(ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                })
            }
            ScalerType::MinMax => {
                let min = ca.min().unwrap_or(0.0);
                let max = ca.max().unwrap_or(1.0);
                let range = max - min;
                Ok(ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                })
            }
        }
    }

    fn scale_series(&self, series: &Series, params: &ScalerParams) -> Result<Series> {
        let ca = Self::as_f64(series)?;

        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.center) / params.scale))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }

    fn as_f64(series: &Series) -> Result<Float64Chunked> {
        series
            .cast(&DataType::Float64)
            .and_then(|s| s.f64().cloned())
            .map_err(|e| BenchError::Data(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_column() -> DataFrame {
        DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_standard_scaler() {
        let df = single_column();
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        let mean: f64 = col.mean().unwrap();
        assert!(mean.abs() < 1e-10);
    }

    #[test]
    fn test_minmax_scaler() {
        let df = single_column();
        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&df).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!((col.min().unwrap() - 0.0).abs() < 1e-10);
        assert!((col.max().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_fit_transform_then_transform_idempotent() {
        let df = single_column();
        let mut scaler = Scaler::new(ScalerType::Standard);
        let first = scaler.fit_transform(&df).unwrap();
        let second = scaler.transform(&df).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_constant_column_does_not_explode() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[2.0, 2.0, 2.0]).into(),
        ])
        .unwrap();

        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df).unwrap();
        let col = result.column("a").unwrap().f64().unwrap();
        for v in col.into_iter().flatten() {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = single_column();
        let scaler = Scaler::new(ScalerType::Standard);
        assert!(matches!(scaler.transform(&df), Err(BenchError::NotFitted)));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("SS".parse::<ScalerType>().unwrap(), ScalerType::Standard);
        assert_eq!("MM".parse::<ScalerType>().unwrap(), ScalerType::MinMax);
        assert!(matches!(
            "robust".parse::<ScalerType>(),
            Err(BenchError::Configuration(_))
        ));
    }
}
