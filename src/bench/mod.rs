//! Dataset evaluation loop
//!
//! Iterates a directory of delimited datasets, preprocesses each one, fits
//! three default-config boosting regressors plus the three hyperparameter
//! selectors, scores everything with R² on a held-out split, and serializes
//! the per-dataset results to a date-named JSON report.

use crate::error::{BenchError, Result};
use crate::optimizer::{GpSelector, GridSelector, TpeSelector};
use crate::preprocessing::{build_feature_preprocessor, build_target_preprocessor, Objective};
use crate::training::{
    r2_score, train_test_split, CatBoostConfig, CatBoostRegressor, LightGbmConfig,
    LightGbmRegressor, Model, XgBoostConfig, XgBoostRegressor,
};
use crate::utils::{rename_column, to_feature_matrix, to_target_vector, DataLoader};
use chrono::Local;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Canonical target column name after renaming
pub const CANONICAL_TARGET: &str = "class";

/// Evaluation run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Directory of dataset files
    pub dataset_dir: PathBuf,
    /// Column to rename to the canonical target name
    pub target_column: String,
    /// Objective driving target imputation
    pub objective: Objective,
    /// Held-out fraction for scoring
    pub test_size: f64,
    /// Seed for splitting and model fitting
    pub seed: u64,
    /// CV folds inside the selectors
    pub folds: usize,
    /// Grid stages to walk per family
    pub grid_steps: usize,
    /// TPE trial budget
    pub tpe_evals: usize,
    /// GP trial budget per family
    pub gp_evals: usize,
    /// Evaluate at most this many datasets
    pub max_datasets: usize,
    /// Where the JSON report lands
    pub output_dir: PathBuf,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("datasets"),
            target_column: CANONICAL_TARGET.to_string(),
            objective: Objective::Regression,
            test_size: 0.2,
            seed: 42,
            folds: 3,
            grid_steps: 6,
            tpe_evals: 10,
            gp_evals: 50,
            max_datasets: 20,
            output_dir: PathBuf::from("."),
        }
    }
}

impl EvalConfig {
    pub fn new(dataset_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_target_column(mut self, name: impl Into<String>) -> Self {
        self.target_column = name.into();
        self
    }

    pub fn with_budgets(mut self, grid_steps: usize, tpe_evals: usize, gp_evals: usize) -> Self {
        self.grid_steps = grid_steps;
        self.tpe_evals = tpe_evals;
        self.gp_evals = gp_evals;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_max_datasets(mut self, n: usize) -> Self {
        self.max_datasets = n;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Report file name for a run finishing today: `<ISO-date>_<cap>.json`
    pub fn report_file_name(&self) -> String {
        format!(
            "{}_{}.json",
            Local::now().format("%Y-%m-%d"),
            self.max_datasets
        )
    }
}

/// One dataset's per-method scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub lgbm: f64,
    pub xgb: f64,
    pub cat: f64,
    pub bayes_hyperopt: f64,
    pub bayes_scikit: f64,
    pub grid: f64,
    pub name: String,
}

/// Outcome of a full evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub scores: Vec<ScoreRecord>,
    pub failed: Vec<String>,
    pub output_path: PathBuf,
}

/// Run the branch pipelines over a loaded dataset and return model-ready
/// arrays. The frame must already contain the canonical target column.
pub fn preprocess_data(
    df: &DataFrame,
    objective: Objective,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let target_df = df
        .select([CANONICAL_TARGET])
        .map_err(|_| BenchError::FeatureNotFound(CANONICAL_TARGET.to_string()))?;
    let features_df = df
        .drop(CANONICAL_TARGET)
        .map_err(|e| BenchError::Data(e.to_string()))?;

    let mut target_preprocessor = build_target_preprocessor(&target_df, objective)?;
    let mut feature_preprocessor = build_feature_preprocessor(&features_df)?;

    let y = to_target_vector(&target_preprocessor.fit_transform(&target_df)?)?;
    let x = to_feature_matrix(&feature_preprocessor.fit_transform(&features_df)?)?;

    Ok((x, y))
}

fn fit_and_score<M: Model>(
    mut model: M,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<f64> {
    model.fit(x_train, y_train)?;
    Ok(r2_score(y_test, &model.predict(x_test)?))
}

/// Evaluate one dataset file end to end.
pub fn score_dataset(path: &Path, config: &EvalConfig) -> Result<ScoreRecord> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut df = DataLoader::new().load_auto(path)?;
    if config.target_column != CANONICAL_TARGET {
        rename_column(&mut df, &config.target_column, CANONICAL_TARGET)?;
    } else if df.column(CANONICAL_TARGET).is_err() {
        return Err(BenchError::FeatureNotFound(CANONICAL_TARGET.to_string()));
    }

    let (x, y) = preprocess_data(&df, config.objective)?;
    let (x_train, x_test, y_train, y_test) =
        train_test_split(&x, &y, config.test_size, config.seed)?;

    let seed = config.seed;

    let lgbm = {
        let mut model = LightGbmRegressor::new(LightGbmConfig {
            random_state: Some(seed),
            ..Default::default()
        });
        model.fit(&x_train, &y_train)?;
        r2_score(&y_test, &model.predict(&x_test)?)
    };

    let xgb = {
        let mut model = XgBoostRegressor::new(XgBoostConfig {
            random_state: Some(seed),
            ..Default::default()
        });
        model.fit(&x_train, &y_train)?;
        r2_score(&y_test, &model.predict(&x_test)?)
    };

    let cat = {
        let mut model = CatBoostRegressor::new(CatBoostConfig {
            random_state: Some(seed),
            ..Default::default()
        });
        model.fit(&x_train, &y_train)?;
        r2_score(&y_test, &model.predict(&x_test)?)
    };

    let bayes_hyperopt = fit_and_score(
        TpeSelector::new(config.folds, config.tpe_evals).with_seed(seed),
        &x_train,
        &y_train,
        &x_test,
        &y_test,
    )?;

    let bayes_scikit = fit_and_score(
        GpSelector::new(config.folds, config.gp_evals).with_seed(seed),
        &x_train,
        &y_train,
        &x_test,
        &y_test,
    )?;

    let grid = fit_and_score(
        GridSelector::new(config.folds, config.grid_steps).with_seed(seed),
        &x_train,
        &y_train,
        &x_test,
        &y_test,
    )?;

    Ok(ScoreRecord {
        lgbm,
        xgb,
        cat,
        bayes_hyperopt,
        bayes_scikit,
        grid,
        name,
    })
}

/// List dataset files, sorted by file name for reproducible capping.
fn list_datasets(dir: &Path, cap: usize) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    paths.truncate(cap);
    Ok(paths)
}

/// Run the full evaluation and write the JSON report.
///
/// Recoverable per-dataset errors are logged and collected in the failure
/// list; configuration and state errors abort the run.
pub fn evaluate(config: &EvalConfig) -> Result<EvalReport> {
    let datasets = list_datasets(&config.dataset_dir, config.max_datasets)?;
    info!(count = datasets.len(), dir = %config.dataset_dir.display(), "starting evaluation");

    let mut scores: Vec<ScoreRecord> = Vec::new();
    let mut failed: Vec<String> = Vec::new();

    for path in &datasets {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match score_dataset(path, config) {
            Ok(record) => {
                info!(dataset = %name, lgbm = record.lgbm, xgb = record.xgb, cat = record.cat, "scored");
                scores.push(record);
            }
            Err(err) if err.is_recoverable() => {
                warn!(dataset = %name, error = %err, "dataset failed");
                failed.push(name);
            }
            Err(err) => return Err(err),
        }
    }

    let output_path = config.output_dir.join(config.report_file_name());
    let json = serde_json::to_string(&scores)?;
    std::fs::write(&output_path, json)?;
    info!(path = %output_path.display(), scored = scores.len(), failed = failed.len(), "report written");

    Ok(EvalReport {
        scores,
        failed,
        output_path,
    })
}
