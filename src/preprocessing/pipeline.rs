//! Branching preprocessing pipeline
//!
//! A [`Preprocessor`] fans a table out to independent named branches, each an
//! ordered chain of transformer steps, and fans back in by column-wise
//! concatenation. Every branch sees the *original* input, never another
//! branch's output, so heterogeneous column subsets (categorical vs numeric)
//! get independent treatment without manual column bookkeeping.

use crate::error::{BenchError, Result};
use super::{
    encoder::{Encoder, EncoderType},
    imputer::{Imputer, ImputeStrategy},
    scaler::{Scaler, ScalerType},
    selector::DtypeSelector,
    ColumnType, Objective,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One step in a branch chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransformStep {
    Select(DtypeSelector),
    Impute(Imputer),
    Encode(Encoder),
    Scale(Scaler),
}

impl TransformStep {
    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            TransformStep::Select(selector) => selector.select(df),
            TransformStep::Impute(imputer) => imputer.fit_transform(df),
            TransformStep::Encode(encoder) => encoder.fit_transform(df),
            TransformStep::Scale(scaler) => scaler.fit_transform(df),
        }
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            TransformStep::Select(selector) => selector.select(df),
            TransformStep::Impute(imputer) => imputer.transform(df),
            TransformStep::Encode(encoder) => encoder.transform(df),
            TransformStep::Scale(scaler) => scaler.transform(df),
        }
    }
}

/// A named, ordered chain of transformer steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    name: String,
    steps: Vec<TransformStep>,
}

impl Branch {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let mut current = df.clone();
        for step in &mut self.steps {
            current = step.fit_transform(&current)?;
        }
        Ok(current)
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut current = df.clone();
        for step in &self.steps {
            current = step.transform(&current)?;
        }
        Ok(current)
    }
}

/// Branching pipeline builder.
///
/// Lifecycle: `created → branches added → merged (terminal)`. Branch and
/// step registration are rejected after merge; fitting is rejected before
/// merge. Branch outputs are concatenated in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    branches: Vec<Branch>,
    merged: bool,
    is_fitted: bool,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
            merged: false,
            is_fitted: false,
        }
    }

    /// Register a new, empty branch.
    pub fn add_branch(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        if self.merged {
            return Err(BenchError::State(
                "cannot add a branch after merge".to_string(),
            ));
        }
        let name = name.into();
        if self.branches.iter().any(|b| b.name == name) {
            return Err(BenchError::Configuration(format!(
                "branch {name} already exists"
            )));
        }
        self.branches.push(Branch::new(name));
        Ok(self)
    }

    /// Append a transformer step to an existing branch.
    pub fn add_transformer(
        &mut self,
        branch: &str,
        step: TransformStep,
    ) -> Result<&mut Self> {
        if self.merged {
            return Err(BenchError::State(
                "cannot add a transformer after merge".to_string(),
            ));
        }
        let target = self
            .branches
            .iter_mut()
            .find(|b| b.name == branch)
            .ok_or_else(|| BenchError::Configuration(format!("no such branch: {branch}")))?;
        target.steps.push(step);
        Ok(self)
    }

    /// Seal the pipeline. Terminal: no further branches or steps.
    pub fn merge(&mut self) -> Result<&mut Self> {
        if self.merged {
            return Err(BenchError::State("preprocessor already merged".to_string()));
        }
        if self.branches.is_empty() {
            return Err(BenchError::Configuration(
                "preprocessor has no branches".to_string(),
            ));
        }
        self.merged = true;
        Ok(self)
    }

    /// Fit every branch against the original input and concatenate the
    /// branch outputs column-wise, in branch-insertion order.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        if !self.merged {
            return Err(BenchError::State(
                "fit_transform called before merge".to_string(),
            ));
        }

        let mut outputs = Vec::with_capacity(self.branches.len());
        for branch in &mut self.branches {
            outputs.push(branch.fit_transform(df)?);
        }
        self.is_fitted = true;
        Self::concat(outputs)
    }

    /// Replay the fitted branches on new data.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.merged {
            return Err(BenchError::State(
                "transform called before merge".to_string(),
            ));
        }
        if !self.is_fitted {
            return Err(BenchError::NotFitted);
        }

        let outputs = self
            .branches
            .iter()
            .map(|branch| branch.transform(df))
            .collect::<Result<Vec<_>>>()?;
        Self::concat(outputs)
    }

    pub fn branch_names(&self) -> Vec<&str> {
        self.branches.iter().map(|b| b.name.as_str()).collect()
    }

    fn concat(outputs: Vec<DataFrame>) -> Result<DataFrame> {
        let mut iter = outputs.into_iter();
        let mut combined = iter
            .next()
            .ok_or_else(|| BenchError::Configuration("nothing to produce".to_string()))?;

        for frame in iter {
            if frame.height() != combined.height() {
                return Err(BenchError::Data(format!(
                    "branch output row mismatch: {} vs {}",
                    combined.height(),
                    frame.height()
                )));
            }
            combined = combined
                .hstack(frame.get_columns())
                .map_err(|e| BenchError::Data(e.to_string()))?;
        }
        Ok(combined)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the merged feature pipeline for a table.
///
/// A "categorical" branch (select categorical → impute most-frequent →
/// one-hot) is added only when at least one categorical column exists, a
/// "numerical" branch (select numeric → impute mean → standard-scale) only
/// when at least one numeric column exists. A table with neither is a data
/// error.
pub fn build_feature_preprocessor(df: &DataFrame) -> Result<Preprocessor> {
    let has_categorical = df
        .get_columns()
        .iter()
        .any(|c| ColumnType::of(c.dtype()) == Some(ColumnType::Categorical));
    let has_numeric = df
        .get_columns()
        .iter()
        .any(|c| ColumnType::of(c.dtype()) == Some(ColumnType::Numeric));

    let mut preprocessor = Preprocessor::new();

    if has_categorical {
        preprocessor.add_branch("categorical")?;
        preprocessor.add_transformer(
            "categorical",
            TransformStep::Select(DtypeSelector::new(ColumnType::Categorical)),
        )?;
        preprocessor.add_transformer(
            "categorical",
            TransformStep::Impute(Imputer::new(ImputeStrategy::MostFrequent)),
        )?;
        preprocessor.add_transformer(
            "categorical",
            TransformStep::Encode(Encoder::new(EncoderType::OneHot)),
        )?;
    }

    if has_numeric {
        preprocessor.add_branch("numerical")?;
        preprocessor.add_transformer(
            "numerical",
            TransformStep::Select(DtypeSelector::new(ColumnType::Numeric)),
        )?;
        preprocessor.add_transformer(
            "numerical",
            TransformStep::Impute(Imputer::new(ImputeStrategy::Mean)),
        )?;
        preprocessor.add_transformer(
            "numerical",
            TransformStep::Scale(Scaler::new(ScalerType::Standard)),
        )?;
    }

    if preprocessor.branches.is_empty() {
        return Err(BenchError::Data(
            "table has neither numeric nor categorical columns".to_string(),
        ));
    }

    preprocessor.merge()?;
    Ok(preprocessor)
}

/// Build the merged target pipeline for a single-column target frame.
///
/// Categorical targets are always imputed most-frequent then label-encoded,
/// collapsing to one integer-coded column. Numeric targets are imputed mean
/// under a regression objective, most-frequent under classification, and
/// passed through untouched otherwise.
pub fn build_target_preprocessor(target: &DataFrame, objective: Objective) -> Result<Preprocessor> {
    let dtype = target
        .get_columns()
        .first()
        .map(|c| ColumnType::of(c.dtype()))
        .ok_or_else(|| BenchError::Data("target frame is empty".to_string()))?;

    let mut preprocessor = Preprocessor::new();
    preprocessor.add_branch("target")?;

    match dtype {
        Some(ColumnType::Categorical) => {
            preprocessor.add_transformer(
                "target",
                TransformStep::Impute(Imputer::new(ImputeStrategy::MostFrequent)),
            )?;
            preprocessor.add_transformer(
                "target",
                TransformStep::Encode(Encoder::new(EncoderType::Label)),
            )?;
        }
        Some(ColumnType::Numeric) => match objective {
            Objective::Regression => {
                preprocessor.add_transformer(
                    "target",
                    TransformStep::Impute(Imputer::new(ImputeStrategy::Mean)),
                )?;
            }
            Objective::Classification => {
                preprocessor.add_transformer(
                    "target",
                    TransformStep::Impute(Imputer::new(ImputeStrategy::MostFrequent)),
                )?;
            }
            Objective::Other => {}
        },
        None => {
            return Err(BenchError::Data(
                "target column is neither numeric nor categorical".to_string(),
            ));
        }
    }

    preprocessor.merge()?;
    Ok(preprocessor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("a".into(), &[Some(1.0), Some(2.0), None]).into(),
            Series::new("b".into(), &["x", "y", "x"]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_fit_before_merge_fails() {
        let df = mixed_frame();
        let mut preprocessor = Preprocessor::new();
        preprocessor.add_branch("numerical").unwrap();

        let result = preprocessor.fit_transform(&df);
        assert!(matches!(result, Err(BenchError::State(_))));
    }

    #[test]
    fn test_merge_twice_fails() {
        let mut preprocessor = Preprocessor::new();
        preprocessor.add_branch("target").unwrap();
        preprocessor.merge().unwrap();

        assert!(matches!(preprocessor.merge(), Err(BenchError::State(_))));
    }

    #[test]
    fn test_merge_without_branches_fails() {
        let mut preprocessor = Preprocessor::new();
        assert!(matches!(
            preprocessor.merge(),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_add_after_merge_fails() {
        let mut preprocessor = Preprocessor::new();
        preprocessor.add_branch("target").unwrap();
        preprocessor.merge().unwrap();

        assert!(matches!(
            preprocessor.add_branch("late"),
            Err(BenchError::State(_))
        ));
        assert!(matches!(
            preprocessor.add_transformer(
                "target",
                TransformStep::Impute(Imputer::new(ImputeStrategy::Mean))
            ),
            Err(BenchError::State(_))
        ));
    }

    #[test]
    fn test_duplicate_branch_fails() {
        let mut preprocessor = Preprocessor::new();
        preprocessor.add_branch("target").unwrap();
        assert!(matches!(
            preprocessor.add_branch("target"),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_branch_fails() {
        let mut preprocessor = Preprocessor::new();
        let result = preprocessor.add_transformer(
            "ghost",
            TransformStep::Impute(Imputer::new(ImputeStrategy::Mean)),
        );
        assert!(matches!(result, Err(BenchError::Configuration(_))));
    }

    #[test]
    fn test_branches_see_original_input() {
        // Both branches select from the same original frame, so the numeric
        // branch still finds "a" even though the categorical branch ran first.
        let df = mixed_frame();
        let mut preprocessor = build_feature_preprocessor(&df).unwrap();
        let result = preprocessor.fit_transform(&df).unwrap();

        // 2 one-hot columns for "b" + 1 scaled numeric column
        assert_eq!(result.width(), 3);
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn test_feature_pipeline_numeric_only() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0]).into(),
        ])
        .unwrap();
        let mut preprocessor = build_feature_preprocessor(&df).unwrap();
        assert_eq!(preprocessor.branch_names(), vec!["numerical"]);

        let result = preprocessor.fit_transform(&df).unwrap();
        assert_eq!(result.width(), 1);
    }

    #[test]
    fn test_feature_pipeline_categorical_only() {
        let df = DataFrame::new(vec![
            Series::new("b".into(), &["u", "v", "u"]).into(),
        ])
        .unwrap();
        let mut preprocessor = build_feature_preprocessor(&df).unwrap();
        assert_eq!(preprocessor.branch_names(), vec!["categorical"]);

        let result = preprocessor.fit_transform(&df).unwrap();
        assert_eq!(result.width(), 2);
    }

    #[test]
    fn test_target_pipeline_categorical() {
        let target = DataFrame::new(vec![
            Series::new("class".into(), &["cat", "dog", "cat"]).into(),
        ])
        .unwrap();
        let mut preprocessor =
            build_target_preprocessor(&target, Objective::Regression).unwrap();
        let result = preprocessor.fit_transform(&target).unwrap();

        assert_eq!(result.width(), 1);
        let codes = result.column("class").unwrap().f64().unwrap();
        assert_eq!(codes.get(0).unwrap(), 0.0);
        assert_eq!(codes.get(1).unwrap(), 1.0);
    }

    #[test]
    fn test_target_pipeline_numeric_regression() {
        let target = DataFrame::new(vec![
            Series::new("class".into(), &[Some(10.0), None, Some(30.0)]).into(),
        ])
        .unwrap();
        let mut preprocessor =
            build_target_preprocessor(&target, Objective::Regression).unwrap();
        let result = preprocessor.fit_transform(&target).unwrap();

        assert_eq!(result.width(), 1);
        let values = result.column("class").unwrap().f64().unwrap();
        assert!((values.get(1).unwrap() - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_target_pipeline_other_objective_is_identity() {
        let target = DataFrame::new(vec![
            Series::new("class".into(), &[10.0, 20.0, 30.0]).into(),
        ])
        .unwrap();
        let mut preprocessor = build_target_preprocessor(&target, Objective::Other).unwrap();
        let result = preprocessor.fit_transform(&target).unwrap();
        assert_eq!(result, target);
    }

    #[test]
    fn test_transform_replays_fitted_state() {
        let df = mixed_frame();
        let mut preprocessor = build_feature_preprocessor(&df).unwrap();
        let first = preprocessor.fit_transform(&df).unwrap();
        let second = preprocessor.transform(&df).unwrap();
        assert_eq!(first, second);
    }
}
