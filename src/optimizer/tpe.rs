//! Tree-structured Parzen estimator selector
//!
//! Splits completed trials into good and bad groups at the gamma quantile,
//! fits a univariate Gaussian KDE per dimension to each group, and samples
//! candidates that maximize the density ratio l(x)/g(x). The model family
//! itself is a categorical choice at the root of the space, reweighted by
//! how often each family lands in the good group.

use crate::error::{BenchError, Result};
use crate::search_space::{tpe_spaces, Domain, FamilySpace, ModelFamily};
use crate::training::Model;
use super::{cv_score, fit_family_model, FittedModel, TrialParams};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

struct Trial {
    family_idx: usize,
    params: TrialParams,
    score: f64,
}

/// TPE-based selector over all three model families.
pub struct TpeSelector {
    folds: usize,
    max_evals: usize,
    n_startup: usize,
    gamma: f64,
    n_candidates: usize,
    seed: u64,
    best: Option<FittedModel>,
    best_family: Option<ModelFamily>,
    best_params: TrialParams,
    best_score: Option<f64>,
}

impl TpeSelector {
    pub fn new(folds: usize, max_evals: usize) -> Self {
        Self {
            folds,
            max_evals,
            n_startup: 5,
            gamma: 0.25,
            n_candidates: 24,
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

    pub fn with_n_startup(mut self, n: usize) -> Self {
        self.n_startup = n;
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

    fn random_trial(
        spaces: &[FamilySpace],
        rng: &mut Xoshiro256PlusPlus,
    ) -> (usize, TrialParams) {
        let family_idx = rng.gen_range(0..spaces.len());
        let mut params = TrialParams::new();
        for param in &spaces[family_idx].params {
            params.insert(param.name.to_string(), param.domain.sample(rng));
        }
        (family_idx, params)
    }

    /// Split history into (good, bad) at the gamma quantile. Scores are
    /// maximized, so "good" is the top fraction.
    fn split_history<'a>(&self, history: &'a [Trial]) -> (Vec<&'a Trial>, Vec<&'a Trial>) {
        let mut order: Vec<usize> = (0..history.len()).collect();
        order.sort_by(|&a, &b| {
            history[b]
                .score
                .partial_cmp(&history[a].score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let n_good = ((history.len() as f64 * self.gamma).ceil() as usize)
            .max(1)
            .min(history.len() - 1);

        let good = order[..n_good].iter().map(|&i| &history[i]).collect();
        let bad = order[n_good..].iter().map(|&i| &history[i]).collect();
        (good, bad)
    }

    fn tpe_trial(
        &self,
        spaces: &[FamilySpace],
        history: &[Trial],
        rng: &mut Xoshiro256PlusPlus,
    ) -> (usize, TrialParams) {
        let (good, bad) = self.split_history(history);

        // Categorical family choice: Laplace-smoothed good/bad frequency ratio
        let k = spaces.len() as f64;
        let family_idx = (0..spaces.len())
            .map(|idx| {
                let g = good.iter().filter(|t| t.family_idx == idx).count() as f64;
                let b = bad.iter().filter(|t| t.family_idx == idx).count() as f64;
                let l_density = (g + 1.0) / (good.len() as f64 + k);
                let g_density = (b + 1.0) / (bad.len() as f64 + k);
                (idx, l_density / g_density)
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        let space = &spaces[family_idx];
        let mut params = TrialParams::new();

        for param in &space.params {
            let good_values = Self::values_of(&good, family_idx, param.name);
            let bad_values = Self::values_of(&bad, family_idx, param.name);

            let value = if good_values.len() < 2 || bad_values.is_empty() {
                param.domain.sample(rng)
            } else {
                self.sample_dimension(&param.domain, &good_values, &bad_values, rng)
            };
            params.insert(param.name.to_string(), value);
        }

        (family_idx, params)
    }

    fn values_of(trials: &[&Trial], family_idx: usize, name: &str) -> Vec<f64> {
        trials
            .iter()
            .filter(|t| t.family_idx == family_idx)
            .filter_map(|t| t.params.get(name).copied())
            .collect()
    }

    /// Draw candidates from the good-group KDE and keep the one with the
    /// best l(x)/g(x) ratio.
    fn sample_dimension(
        &self,
        domain: &Domain,
        good_values: &[f64],
        bad_values: &[f64],
        rng: &mut Xoshiro256PlusPlus,
    ) -> f64 {
        let to_internal = |v: f64| if domain.is_log() { v.ln() } else { v };
        let from_internal = |v: f64| if domain.is_log() { v.exp() } else { v };

        let good: Vec<f64> = good_values.iter().map(|&v| to_internal(v)).collect();
        let bad: Vec<f64> = bad_values.iter().map(|&v| to_internal(v)).collect();

        let range = to_internal(domain.high()) - to_internal(domain.low());
        let l_bw = scott_bandwidth(&good, range);
        let g_bw = scott_bandwidth(&bad, range);

        let mut best_value = good[0];
        let mut best_ratio = f64::NEG_INFINITY;

        for _ in 0..self.n_candidates {
            let center = good[rng.gen_range(0..good.len())];
            let candidate = center + l_bw * gauss(rng);

            let l_density = kde_pdf(&good, l_bw, candidate);
            let g_density = kde_pdf(&bad, g_bw, candidate).max(f64::EPSILON);
            let ratio = l_density / g_density;

            if ratio > best_ratio {
                best_ratio = ratio;
                best_value = candidate;
            }
        }

        domain.project(from_internal(best_value))
    }
}

/// Scott's rule bandwidth with a floor tied to the domain width
fn scott_bandwidth(values: &[f64], range: f64) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let sigma = var.sqrt();
    (sigma * n.powf(-0.2)).max(range.abs() * 1e-3).max(1e-12)
}

fn kde_pdf(values: &[f64], bandwidth: f64, x: f64) -> f64 {
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth);
    values
        .iter()
        .map(|&v| {
            let z = (x - v) / bandwidth;
            norm * (-0.5 * z * z).exp()
        })
        .sum::<f64>()
        / values.len() as f64
}

/// Standard normal draw via Box-Muller
fn gauss(rng: &mut Xoshiro256PlusPlus) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

impl Model for TpeSelector {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let spaces = tpe_spaces(true, true, true);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut history: Vec<Trial> = Vec::with_capacity(self.max_evals);

        for trial_id in 0..self.max_evals {
            let (family_idx, params) = if history.len() < self.n_startup.max(2) {
                Self::random_trial(&spaces, &mut rng)
            } else {
                self.tpe_trial(&spaces, &history, &mut rng)
            };

            let score = cv_score(
                spaces[family_idx].family,
                &params,
                x,
                y,
                self.folds,
                self.seed,
            )?;
            debug!(trial_id, family = %spaces[family_idx].family, score, "tpe trial");

            history.push(Trial {
                family_idx,
                params,
                score,
            });
        }

        let best_trial = history
            .iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| BenchError::Configuration("max_evals must be > 0".to_string()))?;

        let family = spaces[best_trial.family_idx].family;
        self.best = Some(fit_family_model(family, &best_trial.params, x, y, self.seed)?);
        self.best_family = Some(family);
        self.best_params = best_trial.params.clone();
        self.best_score = Some(best_trial.score);
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

    fn make_history(scores: &[f64]) -> Vec<Trial> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| Trial {
                family_idx: i % 2,
                params: TrialParams::new(),
                score,
            })
            .collect()
    }

    #[test]
    fn test_split_history_puts_high_scores_in_good() {
        let selector = TpeSelector::new(3, 10);
        let history = make_history(&[0.1, 0.9, 0.5, 0.2, 0.8, 0.3, 0.4, 0.6]);
        let (good, bad) = selector.split_history(&history);

        assert_eq!(good.len(), 2);
        assert!(good.iter().all(|t| t.score >= 0.8));
        assert_eq!(bad.len(), 6);
    }

    #[test]
    fn test_split_history_never_empties_a_group() {
        let selector = TpeSelector::new(3, 10);
        let history = make_history(&[0.5, 0.6]);
        let (good, bad) = selector.split_history(&history);
        assert_eq!(good.len(), 1);
        assert_eq!(bad.len(), 1);
    }

    #[test]
    fn test_kde_pdf_peaks_at_data() {
        let values = vec![0.0, 0.0, 0.0];
        assert!(kde_pdf(&values, 0.1, 0.0) > kde_pdf(&values, 0.1, 1.0));
    }

    #[test]
    fn test_sampled_dimension_respects_domain() {
        let selector = TpeSelector::new(3, 10);
        let domain = Domain::QUniform { low: 50.0, high: 1000.0, q: 25.0 };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);

        let good = vec![100.0, 125.0, 150.0];
        let bad = vec![800.0, 900.0, 1000.0];
        for _ in 0..20 {
            let v = selector.sample_dimension(&domain, &good, &bad, &mut rng);
            assert!((50.0..=1000.0).contains(&v));
            assert_eq!((v - 50.0) % 25.0, 0.0);
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let selector = TpeSelector::new(3, 10);
        let x = Array2::<f64>::zeros((2, 2));
        assert!(matches!(selector.predict(&x), Err(BenchError::NotFitted)));
    }
}
