//! Missing value imputation

use crate::error::{BenchError, Result};
use super::ColumnType;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Strategy for filling missing values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Column mean (numeric columns only)
    Mean,
    /// Most frequent value (numeric or categorical)
    MostFrequent,
}

impl FromStr for ImputeStrategy {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(ImputeStrategy::Mean),
            "most_frequent" => Ok(ImputeStrategy::MostFrequent),
            other => Err(BenchError::Configuration(format!(
                "unknown impute strategy: {other}"
            ))),
        }
    }
}

/// Fill value learned for one column during fit
#[derive(Debug, Clone, Serialize, Deserialize)]
enum FillValue {
    Float(f64),
    Str(String),
}

/// Missing value imputer over all columns of a frame.
///
/// Numeric columns are cast to `Float64` on the way through, so downstream
/// scaling always sees floats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, FillValue>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.fill_values.clear();

        for col in df.get_columns() {
            let name = col.name().to_string();
            let series = col.as_materialized_series();
            let is_numeric = ColumnType::of(series.dtype()) == Some(ColumnType::Numeric);
            let fill = match (self.strategy, is_numeric) {
                (ImputeStrategy::Mean, true) => {
                    let ca = Self::as_f64(series)?;
                    FillValue::Float(ca.mean().unwrap_or(0.0))
                }
                (ImputeStrategy::Mean, false) => {
                    return Err(BenchError::Data(format!(
                        "mean imputation requires a numeric column, got {:?} for {name}",
                        series.dtype()
                    )));
                }
                (ImputeStrategy::MostFrequent, true) => {
                    let ca = Self::as_f64(series)?;
                    let mut values: Vec<f64> = ca.into_iter().flatten().collect();
                    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                    FillValue::Float(Self::longest_run(&values).unwrap_or(0.0))
                }
                (ImputeStrategy::MostFrequent, false) => {
                    let ca = series
                        .str()
                        .map_err(|e| BenchError::Data(e.to_string()))?;
                    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                    for value in ca.into_iter().flatten() {
                        *counts.entry(value).or_insert(0) += 1;
                    }
                    let mode = counts
                        .iter()
                        .max_by_key(|(_, &count)| count)
                        .map(|(&value, _)| value.to_string())
                        .unwrap_or_default();
                    FillValue::Str(mode)
                }
            };
            self.fill_values.insert(name, fill);
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BenchError::NotFitted);
        }

        let columns: Vec<Column> = df
            .get_columns()
            .iter()
            .map(|col| {
                let name = col.name().clone();
                let series = col.as_materialized_series();
                match self.fill_values.get(name.as_str()) {
                    Some(FillValue::Float(fill)) => {
                        let ca = Self::as_f64(series)?;
                        let filled: Float64Chunked = ca
                            .into_iter()
                            .map(|opt| Some(opt.unwrap_or(*fill)))
                            .collect();
                        Ok(filled.with_name(name).into_series().into())
                    }
                    Some(FillValue::Str(fill)) => {
                        let ca = series
                            .str()
                            .map_err(|e| BenchError::Data(e.to_string()))?;
                        let filled: StringChunked = ca
                            .into_iter()
                            .map(|opt| Some(opt.unwrap_or(fill.as_str())))
                            .collect();
                        Ok(filled.with_name(name).into_series().into())
                    }
                    None => Ok(col.clone()),
                }
            })
            .collect::<Result<Vec<Column>>>()?;

        DataFrame::new(columns).map_err(|e| BenchError::Data(e.to_string()))
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    fn as_f64(series: &Series) -> Result<Float64Chunked> {
        series
            .cast(&DataType::Float64)
            .and_then(|s| s.f64().cloned())
            .map_err(|e| BenchError::Data(e.to_string()))
    }

    /// Mode of a sorted slice; ties resolve to the smallest value.
    fn longest_run(sorted: &[f64]) -> Option<f64> {
        let mut best: Option<(f64, usize)> = None;
        let mut i = 0;
        while i < sorted.len() {
            let mut j = i + 1;
            while j < sorted.len() && sorted[j] == sorted[i] {
                j += 1;
            }
            let run = j - i;
            if best.map_or(true, |(_, count)| run > count) {
                best = Some((sorted[i], run));
            }
            i = j;
        }
        best.map(|(value, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_imputation() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[Some(1.0), Some(2.0), None, Some(3.0)]).into(),
        ])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Mean);
        let result = imputer.fit_transform(&df).unwrap();
        let ca = result.column("a").unwrap().f64().unwrap();

        assert_eq!(ca.null_count(), 0);
        assert!((ca.get(2).unwrap() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_most_frequent_categorical() {
        let df = DataFrame::new(vec![
            Series::new("c".into(), &[Some("x"), Some("y"), None, Some("x")]).into(),
        ])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df).unwrap();
        let ca = result.column("c").unwrap().str().unwrap();

        assert_eq!(ca.get(2).unwrap(), "x");
    }

    #[test]
    fn test_most_frequent_numeric() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[Some(5.0), Some(5.0), None, Some(1.0)]).into(),
        ])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df).unwrap();
        let ca = result.column("a").unwrap().f64().unwrap();

        assert!((ca.get(2).unwrap() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_mean_on_categorical_fails() {
        let df = DataFrame::new(vec![
            Series::new("c".into(), &["x", "y"]).into(),
        ])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Mean);
        assert!(matches!(imputer.fit(&df), Err(BenchError::Data(_))));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0]).into(),
        ])
        .unwrap();
        let imputer = Imputer::new(ImputeStrategy::Mean);
        assert!(matches!(imputer.transform(&df), Err(BenchError::NotFitted)));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("mean".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::Mean);
        assert_eq!(
            "most_frequent".parse::<ImputeStrategy>().unwrap(),
            ImputeStrategy::MostFrequent
        );
        assert!(matches!(
            "median".parse::<ImputeStrategy>(),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_integer_columns_become_float() {
        let df = DataFrame::new(vec![
            Series::new("n".into(), &[1i64, 2, 3]).into(),
        ])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Mean);
        let result = imputer.fit_transform(&df).unwrap();
        assert_eq!(result.column("n").unwrap().dtype(), &DataType::Float64);
    }
}
