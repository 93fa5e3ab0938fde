//! Staged grid search selector

use crate::error::{BenchError, Result};
use crate::search_space::{grid_spaces, GridStage, ModelFamily};
use crate::training::Model;
use super::{cv_score, fit_family_model, FittedModel, TrialParams};
use ndarray::{Array1, Array2};
use tracing::debug;

/// Staged grid search over all three model families.
///
/// Walks each family's grid stages in order: within a stage the cartesian
/// product of the stage's values is scored by k-fold CV with the parameters
/// frozen so far, and the stage winner is fixed before moving on. The family
/// with the best final CV score wins and is refit on the full data.
pub struct GridSelector {
    folds: usize,
    steps: usize,
    seed: u64,
    best: Option<FittedModel>,
    best_family: Option<ModelFamily>,
    best_params: TrialParams,
    best_score: Option<f64>,
}

impl GridSelector {
    pub fn new(folds: usize, steps: usize) -> Self {
        Self {
            folds,
            steps,
            seed: 42,
            best: None,
            best_family: None,
            best_params: TrialParams::new(),
            best_score: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn best_family(&self) -> Option<ModelFamily> {
        self.best_family
    }

    pub fn best_params(&self) -> &TrialParams {
        &self.best_params
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_score
    }

    /// All value combinations of one stage.
    fn stage_combinations(stage: &GridStage) -> Vec<TrialParams> {
        let mut combos = vec![TrialParams::new()];
        for (name, values) in &stage.params {
            let mut expanded = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for &value in values {
                    let mut next = combo.clone();
                    next.insert(name.to_string(), value);
                    expanded.push(next);
                }
            }
            combos = expanded;
        }
        combos
    }

    fn search_family(
        &self,
        family: ModelFamily,
        stages: &[GridStage],
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(TrialParams, f64)> {
        let mut fixed = TrialParams::new();
        let mut score = cv_score(family, &fixed, x, y, self.folds, self.seed)?;

        for stage in stages.iter().take(self.steps) {
            let mut stage_best: Option<(TrialParams, f64)> = None;

            for combo in Self::stage_combinations(stage) {
                let mut trial = fixed.clone();
                trial.extend(combo);
                let trial_score = cv_score(family, &trial, x, y, self.folds, self.seed)?;

                if stage_best
                    .as_ref()
                    .map_or(true, |(_, best)| trial_score > *best)
                {
                    stage_best = Some((trial, trial_score));
                }
            }

            if let Some((winner, winner_score)) = stage_best {
                debug!(family = %family, score = winner_score, "stage winner");
                fixed = winner;
                score = winner_score;
            }
        }

        Ok((fixed, score))
    }
}

impl Model for GridSelector {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let mut winner: Option<(ModelFamily, TrialParams, f64)> = None;

        for space in grid_spaces(true, true, true) {
            let (params, score) = self.search_family(space.family, &space.stages, x, y)?;
            debug!(family = %space.family, score, "family search complete");

            if winner.as_ref().map_or(true, |(_, _, best)| score > *best) {
                winner = Some((space.family, params, score));
            }
        }

        let (family, params, score) =
            winner.ok_or_else(|| BenchError::Configuration("no family enabled".to_string()))?;

        self.best = Some(fit_family_model(family, &params, x, y, self.seed)?);
        self.best_family = Some(family);
        self.best_params = params;
        self.best_score = Some(score);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.best
            .as_ref()
            .ok_or(BenchError::NotFitted)?
            .predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_space::GridSpace;

    #[test]
    fn test_stage_combinations_cartesian() {
        let stage = GridStage {
            params: vec![
                ("a", vec![1.0, 2.0]),
                ("b", vec![10.0, 20.0, 30.0]),
            ],
        };
        let combos = GridSelector::stage_combinations(&stage);
        assert_eq!(combos.len(), 6);
        assert!(combos
            .iter()
            .any(|c| c["a"] == 2.0 && c["b"] == 30.0));
    }

    #[test]
    fn test_steps_cap_limits_search() {
        let spaces = grid_spaces(true, false, false);
        let GridSpace { family, stages } = spaces.into_iter().next().unwrap();

        let x = Array2::from_shape_fn((24, 2), |(r, c)| (r * 2 + c) as f64);
        let y = Array1::from_shape_fn(24, |i| (i as f64).sin());

        // steps = 0 means every family is scored with defaults only
        let selector = GridSelector::new(3, 0);
        let (params, score) = selector.search_family(family, &stages, &x, &y).unwrap();
        assert!(params.is_empty());
        assert!(score.is_finite());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let selector = GridSelector::new(3, 6);
        let x = Array2::<f64>::zeros((2, 2));
        assert!(matches!(
            selector.predict(&x),
            Err(BenchError::NotFitted)
        ));
    }
}
