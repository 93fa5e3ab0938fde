//! boostbench - Gradient-boosting benchmark harness
//!
//! Compares gradient-boosting regressors against hyperparameter-search
//! strategies across a directory of tabular datasets, producing a
//! per-dataset JSON score report.
//!
//! # Modules
//!
//! - [`preprocessing`] - Column selection, imputation, encoding, scaling,
//!   and the branching pipeline builder
//! - [`training`] - Native boosting regressors (XGBoost/LightGBM/CatBoost
//!   style), R² scoring, k-fold CV, train/test splitting
//! - [`search_space`] - Static hyperparameter domains per model family
//! - [`optimizer`] - Grid, TPE, and GP-based model selectors
//! - [`bench`] - The evaluation loop and JSON report writer
//! - [`utils`] - CSV loading and frame/array conversion
//! - [`cli`] - Command-line interface

pub mod error;

pub mod bench;
pub mod cli;
pub mod optimizer;
pub mod preprocessing;
pub mod search_space;
pub mod training;
pub mod utils;

pub use error::{BenchError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{BenchError, Result};

    pub use crate::preprocessing::{
        build_feature_preprocessor, build_target_preprocessor, ColumnType, DtypeSelector, Encoder,
        EncoderType, ImputeStrategy, Imputer, Objective, Preprocessor, Scaler, ScalerType,
        TransformStep,
    };

    pub use crate::training::{
        r2_score, train_test_split, CatBoostConfig, CatBoostRegressor, CrossValidator,
        LightGbmConfig, LightGbmRegressor, Model, RegressionMetrics, XgBoostConfig,
        XgBoostRegressor,
    };

    pub use crate::search_space::{
        gp_spaces, grid_spaces, tpe_spaces, Domain, FamilySpace, GridSpace, ModelFamily, ParamDef,
    };

    pub use crate::optimizer::{
        fit_family_model, FittedModel, GaussianProcess, GpSelector, GridSelector, TpeSelector,
        TrialParams,
    };

    pub use crate::bench::{evaluate, EvalConfig, EvalReport, ScoreRecord};

    pub use crate::utils::{to_feature_matrix, to_target_vector, DataLoader};
}
