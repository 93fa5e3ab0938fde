//! Categorical encoding

use crate::error::{BenchError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Type of categorical encoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EncoderType {
    /// Integer-code each category (single column out per column in)
    Label,
    /// One indicator column per category
    OneHot,
}

impl FromStr for EncoderType {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LE" | "label" => Ok(EncoderType::Label),
            "OHE" | "onehot" => Ok(EncoderType::OneHot),
            other => Err(BenchError::Configuration(format!(
                "unknown encoder kind: {other}"
            ))),
        }
    }
}

/// Categorical encoder over all string columns of a frame.
///
/// Categories are ordered lexicographically at fit time so that codes and
/// indicator-column order are deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    encoder_type: EncoderType,
    categories: BTreeMap<String, Vec<String>>,
    is_fitted: bool,
}

impl Encoder {
    pub fn new(encoder_type: EncoderType) -> Self {
        Self {
            encoder_type,
            categories: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.categories.clear();

        for col in df.get_columns() {
            let name = col.name().to_string();
            let ca = col
                .as_materialized_series()
                .str()
                .map_err(|e| BenchError::Data(format!("cannot encode {name}: {e}")))?;

            let mut unique: Vec<String> = ca
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect();
            unique.sort();
            unique.dedup();

            self.categories.insert(name, unique);
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BenchError::NotFitted);
        }

        let mut columns: Vec<Column> = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            let Some(categories) = self.categories.get(&name) else {
                columns.push(col.clone());
                continue;
            };
            let ca = col
                .as_materialized_series()
                .str()
                .map_err(|e| BenchError::Data(e.to_string()))?;

            match self.encoder_type {
                EncoderType::Label => {
                    let codes: Float64Chunked = ca
                        .into_iter()
                        .map(|opt| {
                            opt.and_then(|value| {
                                categories
                                    .binary_search_by(|c| c.as_str().cmp(value))
                                    .ok()
                                    .map(|idx| idx as f64)
                            })
                        })
                        .collect();
                    if codes.null_count() > ca.null_count() {
                        return Err(BenchError::Data(format!(
                            "unseen category in column {name}"
                        )));
                    }
                    columns.push(codes.with_name(name.into()).into_series().into());
                }
                EncoderType::OneHot => {
                    for category in categories {
                        let indicator: Float64Chunked = ca
                            .into_iter()
                            .map(|opt| {
                                Some(match opt {
                                    Some(value) if value == category => 1.0,
                                    _ => 0.0,
                                })
                            })
                            .collect();
                        let col_name = format!("{name}_{category}");
                        columns.push(indicator.with_name(col_name.into()).into_series().into());
                    }
                }
            }
        }

        DataFrame::new(columns).map_err(|e| BenchError::Data(e.to_string()))
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}
