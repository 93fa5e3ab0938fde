//! Data preprocessing module
//!
//! Provides the building blocks of the benchmark's preprocessing stage:
//! - Column-type selection
//! - Missing value imputation
//! - Categorical encoding (label, one-hot)
//! - Feature scaling (standard, min-max)
//! - A branching pipeline that fans a table out to independent branches and
//!   merges the branch outputs by column-wise concatenation

mod encoder;
mod imputer;
mod pipeline;
mod scaler;
mod selector;

pub use encoder::{Encoder, EncoderType};
pub use imputer::{ImputeStrategy, Imputer};
pub use pipeline::{
    build_feature_preprocessor, build_target_preprocessor, Branch, Preprocessor, TransformStep,
};
pub use scaler::{Scaler, ScalerType};
pub use selector::DtypeSelector;

use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Column scalar type for preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

impl ColumnType {
    /// Classify a polars dtype; returns `None` for types the pipeline does
    /// not handle (dates, lists, ...).
    pub fn of(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => Some(ColumnType::Numeric),
            DataType::String | DataType::Categorical(_, _) => Some(ColumnType::Categorical),
            // Booleans, dates, lists etc. are left out of both branches
            _ => None,
        }
    }
}

/// Modeling objective, used to pick the target imputation strategy.
///
/// Values other than regression and classification are legal and leave a
/// numeric target untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    Regression,
    Classification,
    Other,
}

impl FromStr for Objective {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "regression" => Objective::Regression,
            "classification" => Objective::Classification,
            _ => Objective::Other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_classification() {
        assert_eq!(ColumnType::of(&DataType::Float64), Some(ColumnType::Numeric));
        assert_eq!(ColumnType::of(&DataType::Int32), Some(ColumnType::Numeric));
        assert_eq!(
            ColumnType::of(&DataType::String),
            Some(ColumnType::Categorical)
        );
        assert_eq!(ColumnType::of(&DataType::Date), None);
    }

    #[test]
    fn test_objective_parsing() {
        assert_eq!("regression".parse::<Objective>().unwrap(), Objective::Regression);
        assert_eq!(
            "classification".parse::<Objective>().unwrap(),
            Objective::Classification
        );
        assert_eq!("ranking".parse::<Objective>().unwrap(), Objective::Other);
    }
}
