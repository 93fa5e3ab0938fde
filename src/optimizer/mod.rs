//! Hyperparameter search selectors
//!
//! Three strategies over the static search spaces, all exposing the same
//! estimator contract as the plain regressors (`fit`, `predict`):
//! - [`GridSelector`] — staged exhaustive search over discrete grids
//! - [`TpeSelector`] — tree-structured Parzen estimator over quantized
//!   distributions with a categorical model-family choice
//! - [`GpSelector`] — per-family Gaussian-process surrogate with expected
//!   improvement
//!
//! Selection maximizes k-fold cross-validated R², then the winner is refit
//! on the full training data.

pub mod gaussian_process;
mod grid;
mod tpe;

pub use gaussian_process::{GaussianProcess, GpSelector};
pub use grid::GridSelector;
pub use tpe::TpeSelector;

use crate::error::{BenchError, Result};
use crate::search_space::ModelFamily;
use crate::training::{
    r2_score, CatBoostConfig, CatBoostRegressor, CrossValidator, LightGbmConfig,
    LightGbmRegressor, XgBoostConfig, XgBoostRegressor,
};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sampled hyperparameter assignment, keyed by parameter name.
///
/// All values are carried as `f64`; integer-valued parameters are rounded
/// when the family config is built.
pub type TrialParams = BTreeMap<String, f64>;

/// A fitted model of any family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FittedModel {
    LightGbm(LightGbmRegressor),
    XgBoost(XgBoostRegressor),
    CatBoost(CatBoostRegressor),
}

impl FittedModel {
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            FittedModel::LightGbm(model) => model.predict(x),
            FittedModel::XgBoost(model) => model.predict(x),
            FittedModel::CatBoost(model) => model.predict(x),
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            FittedModel::LightGbm(_) => ModelFamily::LightGbm,
            FittedModel::XgBoost(_) => ModelFamily::XgBoost,
            FittedModel::CatBoost(_) => ModelFamily::CatBoost,
        }
    }
}

fn build_lgbm_config(params: &TrialParams, seed: u64) -> Result<LightGbmConfig> {
    let mut config = LightGbmConfig {
        random_state: Some(seed),
        ..Default::default()
    };
    for (name, &value) in params {
        match name.as_str() {
            "n_estimators" => config.n_estimators = value.round() as usize,
            "learning_rate" => config.learning_rate = value,
            "max_depth" => config.max_depth = Some((value.round() as usize).max(1)),
            "num_leaves" => config.num_leaves = (value.round() as usize).max(2),
            "colsample_bytree" | "feature_fraction" => config.colsample_bytree = value,
            "reg_lambda" => config.reg_lambda = value,
            "reg_alpha" => config.reg_alpha = value,
            "min_split_gain" => config.min_split_gain = value,
            "subsample" => config.subsample = value,
            other => {
                return Err(BenchError::Configuration(format!(
                    "unknown lgbm parameter: {other}"
                )))
            }
        }
    }
    Ok(config)
}

fn build_xgb_config(params: &TrialParams, seed: u64) -> Result<XgBoostConfig> {
    let mut config = XgBoostConfig {
        random_state: Some(seed),
        ..Default::default()
    };
    for (name, &value) in params {
        match name.as_str() {
            "n_estimators" => config.n_estimators = value.round() as usize,
            "learning_rate" => config.learning_rate = value,
            "max_depth" => config.max_depth = (value.round() as usize).max(1),
            "min_child_weight" => config.min_child_weight = value,
            "gamma" => config.gamma = value,
            "subsample" => config.subsample = value,
            "colsample_bytree" => config.colsample_bytree = value,
            "reg_alpha" => config.reg_alpha = value,
            "reg_lambda" => config.reg_lambda = value,
            other => {
                return Err(BenchError::Configuration(format!(
                    "unknown xgb parameter: {other}"
                )))
            }
        }
    }
    Ok(config)
}

fn build_cat_config(params: &TrialParams, seed: u64) -> Result<CatBoostConfig> {
    let mut config = CatBoostConfig {
        random_state: Some(seed),
        ..Default::default()
    };
    for (name, &value) in params {
        match name.as_str() {
            "n_estimators" => config.n_estimators = value.round() as usize,
            "learning_rate" => config.learning_rate = value,
            "depth" => config.depth = (value.round() as usize).max(1),
            "l2_leaf_reg" => config.l2_leaf_reg = value,
            "random_strength" => config.random_strength = value,
            "bagging_temperature" => config.bagging_temperature = value,
            "subsample" => config.subsample = value,
            other => {
                return Err(BenchError::Configuration(format!(
                    "unknown cat parameter: {other}"
                )))
            }
        }
    }
    Ok(config)
}

/// Construct and fit a model of the given family with the given
/// hyperparameters.
pub fn fit_family_model(
    family: ModelFamily,
    params: &TrialParams,
    x: &Array2<f64>,
    y: &Array1<f64>,
    seed: u64,
) -> Result<FittedModel> {
    match family {
        ModelFamily::LightGbm => {
            let mut model = LightGbmRegressor::new(build_lgbm_config(params, seed)?);
            model.fit(x, y)?;
            Ok(FittedModel::LightGbm(model))
        }
        ModelFamily::XgBoost => {
            let mut model = XgBoostRegressor::new(build_xgb_config(params, seed)?);
            model.fit(x, y)?;
            Ok(FittedModel::XgBoost(model))
        }
        ModelFamily::CatBoost => {
            let mut model = CatBoostRegressor::new(build_cat_config(params, seed)?);
            model.fit(x, y)?;
            Ok(FittedModel::CatBoost(model))
        }
    }
}

/// Mean cross-validated R² of a family/parameter combination.
pub(crate) fn cv_score(
    family: ModelFamily,
    params: &TrialParams,
    x: &Array2<f64>,
    y: &Array1<f64>,
    folds: usize,
    seed: u64,
) -> Result<f64> {
    let splits = CrossValidator::new(folds)
        .with_random_state(seed)
        .split(x.nrows())?;

    let mut total = 0.0;
    for split in &splits {
        let x_train = x.select(Axis(0), &split.train_indices);
        let y_train = y.select(Axis(0), &split.train_indices);
        let x_test = x.select(Axis(0), &split.test_indices);
        let y_test = y.select(Axis(0), &split.test_indices);

        let model = fit_family_model(family, params, &x_train, &y_train, seed)?;
        let preds = model.predict(&x_test)?;
        total += r2_score(&y_test, &preds);
    }

    Ok(total / splits.len() as f64)
}
