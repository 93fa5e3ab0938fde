//! Model training module
//!
//! Native gradient-boosting regressors in three flavors:
//! - XGBoost-style: level-wise trees, second-order gain, L1/L2 regularization
//! - LightGBM-style: leaf-wise trees, GOSS sampling
//! - CatBoost-style: symmetric (oblivious) trees, Bayesian bootstrap
//!
//! Plus the shared `Model` trait, R² scoring, k-fold CV and train/test
//! splitting used by the selectors and the evaluation loop.

pub mod catboost;
pub mod cross_validation;
pub mod lightgbm;
mod models;
mod split;
pub mod xgboost;

pub use catboost::{CatBoostConfig, CatBoostRegressor};
pub use cross_validation::{CrossValidator, CvSplit};
pub use lightgbm::{LightGbmConfig, LightGbmRegressor};
pub use models::{r2_score, Model, RegressionMetrics};
pub use split::train_test_split;
pub use xgboost::{XgBoostConfig, XgBoostRegressor};
