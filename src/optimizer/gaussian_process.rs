//! Gaussian-process Bayesian optimization selector
//!
//! A GP regression surrogate (Matérn 5/2 kernel over unit-cube-normalized
//! hyperparameters) with expected improvement acquisition. Each model family
//! gets its own surrogate run; the family with the best observed CV score
//! wins.

use crate::error::{BenchError, Result};
use crate::search_space::{gp_spaces, Domain, FamilySpace, ModelFamily};
use crate::training::Model;
use super::{cv_score, fit_family_model, FittedModel, TrialParams};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

/// Gaussian Process model for regression over normalized inputs
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    /// Matérn 5/2 length scale
    length_scale: f64,
    /// Noise variance added to the kernel diagonal
    noise: f64,
    x_train: Option<Array2<f64>>,
    l_chol: Option<Array2<f64>>,
    alpha: Option<Array1<f64>>,
    y_mean: f64,
    y_std: f64,
}

impl GaussianProcess {
    pub fn new(length_scale: f64) -> Self {
        Self {
            length_scale,
            noise: 1e-6,
            x_train: None,
            l_chol: None,
            alpha: None,
            y_mean: 0.0,
            y_std: 1.0,
        }
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.max(1e-10);
        self
    }

    fn kernel_value(&self, x1: &[f64], x2: &[f64]) -> f64 {
        // Matérn 5/2
        let dist_sq: f64 = x1
            .iter()
            .zip(x2.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        let r = dist_sq.sqrt() / self.length_scale;
        let sqrt5 = 5.0_f64.sqrt();
        (1.0 + sqrt5 * r + 5.0 / 3.0 * r * r) * (-sqrt5 * r).exp()
    }

    /// Fit the GP to training data
    pub fn fit(&mut self, x: Array2<f64>, y: Array1<f64>) {
        let n = y.len();

        self.y_mean = y.mean().unwrap_or(0.0);
        self.y_std = y.std(0.0);
        if self.y_std < 1e-10 {
            self.y_std = 1.0;
        }

        let y_normalized: Array1<f64> = y.iter().map(|&yi| (yi - self.y_mean) / self.y_std).collect();

        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..n {
                k[[i, j]] = self.kernel_value(
                    x.row(i).as_slice().unwrap(),
                    x.row(j).as_slice().unwrap(),
                );
            }
            k[[i, i]] += self.noise;
        }

        let l = Self::cholesky(&k);
        let alpha = Self::solve_triangular_system(&l, &y_normalized);

        self.x_train = Some(x);
        self.l_chol = Some(l);
        self.alpha = Some(alpha);
    }

    /// Predict mean and variance at test points
    pub fn predict(&self, x_test: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        let (Some(x_train), Some(l), Some(alpha)) =
            (self.x_train.as_ref(), self.l_chol.as_ref(), self.alpha.as_ref())
        else {
            return Err(BenchError::NotFitted);
        };

        let n_test = x_test.nrows();
        let n_train = x_train.nrows();

        let mut k_star = Array2::zeros((n_test, n_train));
        for i in 0..n_test {
            for j in 0..n_train {
                k_star[[i, j]] = self.kernel_value(
                    x_test.row(i).as_slice().unwrap(),
                    x_train.row(j).as_slice().unwrap(),
                );
            }
        }

        let mean_normalized: Array1<f64> = k_star.dot(alpha);
        let mean: Array1<f64> = mean_normalized
            .iter()
            .map(|&m| m * self.y_std + self.y_mean)
            .collect();

        let mut var = Array1::zeros(n_test);
        for i in 0..n_test {
            let k_self = self.kernel_value(
                x_test.row(i).as_slice().unwrap(),
                x_test.row(i).as_slice().unwrap(),
            );
            let k_star_i = k_star.row(i).to_owned();
            let v = Self::solve_lower_triangular(l, &k_star_i);
            var[i] = (k_self - v.dot(&v)).max(1e-10) * self.y_std * self.y_std;
        }

        Ok((mean, var))
    }

    fn cholesky(a: &Array2<f64>) -> Array2<f64> {
        let n = a.nrows();
        let mut l = Array2::zeros((n, n));

        for i in 0..n {
            for j in 0..=i {
                let mut sum = 0.0;

                if i == j {
                    for k in 0..j {
                        sum += l[[j, k]] * l[[j, k]];
                    }
                    l[[j, j]] = (a[[j, j]] - sum).max(1e-10).sqrt();
                } else {
                    for k in 0..j {
                        sum += l[[i, k]] * l[[j, k]];
                    }
                    l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]].max(1e-10);
                }
            }
        }
        l
    }

    /// Solve L @ x = b for lower triangular L
    fn solve_lower_triangular(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
        let n = b.len();
        let mut x = Array1::zeros(n);

        for i in 0..n {
            let mut sum = b[i];
            for j in 0..i {
                sum -= l[[i, j]] * x[j];
            }
            x[i] = sum / l[[i, i]].max(1e-10);
        }
        x
    }

    /// Solve L @ L^T @ x = b
    fn solve_triangular_system(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
        let n = b.len();
        let y = Self::solve_lower_triangular(l, b);

        let mut x = Array1::zeros(n);
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= l[[j, i]] * x[j];
            }
            x[i] = sum / l[[i, i]].max(1e-10);
        }
        x
    }
}

/// Standard normal CDF approximation
fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Standard normal PDF
fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Error function approximation (Abramowitz and Stegun)
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

/// Expected improvement for maximization
fn expected_improvement(mean: f64, var: f64, best: f64) -> f64 {
    let std = var.sqrt().max(1e-10);
    let improvement = mean - best;
    let z = improvement / std;
    improvement * normal_cdf(z) + std * normal_pdf(z)
}

/// Map a parameter value into [0, 1], log-scaled for log-uniform domains.
fn to_unit(domain: &Domain, value: f64) -> f64 {
    let (low, high, v) = if domain.is_log() {
        (domain.low().ln(), domain.high().ln(), value.ln())
    } else {
        (domain.low(), domain.high(), value)
    };
    if high - low <= 0.0 {
        0.5
    } else {
        ((v - low) / (high - low)).clamp(0.0, 1.0)
    }
}

/// GP-based Bayesian optimization selector over all three model families.
pub struct GpSelector {
    folds: usize,
    max_evals: usize,
    n_startup: usize,
    n_candidates: usize,
    seed: u64,
    best: Option<FittedModel>,
    best_family: Option<ModelFamily>,
    best_params: TrialParams,
    best_score: Option<f64>,
}

impl GpSelector {
    pub fn new(folds: usize, max_evals: usize) -> Self {
        Self {
            folds,
            max_evals,
            n_startup: 8,
            n_candidates: 200,
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

    fn sample_params(space: &FamilySpace, rng: &mut Xoshiro256PlusPlus) -> TrialParams {
        space
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.domain.sample(rng)))
            .collect()
    }

    fn params_to_unit(space: &FamilySpace, params: &TrialParams) -> Vec<f64> {
        space
            .params
            .iter()
            .map(|p| to_unit(&p.domain, params.get(p.name).copied().unwrap_or(p.domain.low())))
            .collect()
    }

    /// Optimize one family's space; returns the best observed (params, score).
    fn search_family(
        &self,
        space: &FamilySpace,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Result<(TrialParams, f64)> {
        let n_dims = space.params.len();
        let mut history: Vec<(TrialParams, f64)> = Vec::with_capacity(self.max_evals);

        for trial_id in 0..self.max_evals {
            let params = if history.len() < self.n_startup {
                Self::sample_params(space, rng)
            } else {
                // Fit the surrogate to everything observed so far
                let mut x_data = Vec::with_capacity(history.len() * n_dims);
                let mut y_data = Vec::with_capacity(history.len());
                for (p, score) in &history {
                    x_data.extend(Self::params_to_unit(space, p));
                    y_data.push(*score);
                }
                let x_train = Array2::from_shape_vec((history.len(), n_dims), x_data)
                    .map_err(|e| BenchError::Training(e.to_string()))?;
                let y_train = Array1::from_vec(y_data);

                let best_seen = history
                    .iter()
                    .map(|(_, s)| *s)
                    .fold(f64::NEG_INFINITY, f64::max);

                let mut gp = GaussianProcess::new(0.5).with_noise(1e-4);
                gp.fit(x_train, y_train);

                // Pick the acquisition argmax over a random candidate batch
                let mut best_candidate = Self::sample_params(space, rng);
                let mut best_acq = f64::NEG_INFINITY;
                for _ in 0..self.n_candidates {
                    let candidate = Self::sample_params(space, rng);
                    let unit = Self::params_to_unit(space, &candidate);
                    let unit_row = Array2::from_shape_vec((1, n_dims), unit)
                        .map_err(|e| BenchError::Training(e.to_string()))?;
                    let (mean, var) = gp.predict(&unit_row)?;
                    let acq = expected_improvement(mean[0], var[0], best_seen);
                    if acq > best_acq {
                        best_acq = acq;
                        best_candidate = candidate;
                    }
                }
                best_candidate
            };

            let score = cv_score(space.family, &params, x, y, self.folds, self.seed)?;
            debug!(trial_id, family = %space.family, score, "gp trial");
            history.push((params, score));
        }

        history
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| BenchError::Configuration("max_evals must be > 0".to_string()))
    }
}

impl Model for GpSelector {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut winner: Option<(ModelFamily, TrialParams, f64)> = None;

        for space in gp_spaces(true, true, true) {
            let (params, score) = self.search_family(&space, x, y, &mut rng)?;
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
