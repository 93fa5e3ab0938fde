//! CatBoost-style gradient boosting with symmetric trees
//!
//! - Symmetric (oblivious) decision trees: all nodes at the same depth use
//!   the same split
//! - Split-score noise controlled by `random_strength`
//! - Bayesian bootstrap sample weights controlled by `bagging_temperature`

use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub depth: usize,
    /// L2 regularization on leaf values
    pub l2_leaf_reg: f64,
    /// Magnitude of the noise added to split scores
    pub random_strength: f64,
    /// Bayesian bootstrap intensity; 0 disables reweighting
    pub bagging_temperature: f64,
    pub subsample: f64,
    pub random_state: Option<u64>,
}

impl Default for CatBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            depth: 6,
            l2_leaf_reg: 3.0,
            random_strength: 0.0,
            bagging_temperature: 0.0,
            subsample: 1.0,
            random_state: Some(42),
        }
    }
}

/// Symmetric (oblivious) tree: each level uses the same split feature + threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymmetricTree {
    splits: Vec<(usize, f64)>, // (feature, threshold) per level
    leaf_values: Vec<f64>,     // 2^depth leaf values
}

impl SymmetricTree {
    fn predict(&self, sample: &[f64]) -> f64 {
        let mut idx = 0usize;
        for &(feature, threshold) in &self.splits {
            idx = idx * 2 + if sample[feature] > threshold { 1 } else { 0 };
        }
        self.leaf_values[idx.min(self.leaf_values.len() - 1)]
    }
}

fn build_symmetric_tree(
    x: &Array2<f64>,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    config: &CatBoostConfig,
    rng: &mut Xoshiro256PlusPlus,
) -> SymmetricTree {
    let n_features = x.ncols();
    let reg_lambda = config.l2_leaf_reg;

    // A level beyond ~log2(n) cannot separate additional samples, and the
    // leaf array doubles per level, so cap the depth by the sample count.
    let n = indices.len().max(2);
    let depth_limit = config.depth.min((n as f64).log2().ceil() as usize + 1);
    let mut splits = Vec::with_capacity(depth_limit);

    // Current partition of indices into buckets
    let mut buckets: Vec<Vec<usize>> = vec![indices.to_vec()];

    for _depth in 0..depth_limit {
        // Score noise is drawn per feature up front so the parallel scan
        // stays deterministic for a given seed.
        let score_noise: Vec<f64> = (0..n_features)
            .map(|_| {
                if config.random_strength > 0.0 {
                    config.random_strength * rng.gen_range(-1.0..1.0)
                } else {
                    0.0
                }
            })
            .collect();

        // Find best global split across all buckets (symmetric = same split for all)
        let best = (0..n_features)
            .into_par_iter()
            .filter_map(|feat| {
                let mut all_vals: Vec<f64> = buckets
                    .iter()
                    .flat_map(|b| b.iter().map(|&i| x[[i, feat]]))
                    .collect();
                all_vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                all_vals.dedup();

                if all_vals.len() < 2 {
                    return None;
                }

                let mut best_gain = f64::NEG_INFINITY;
                let mut best_thr = 0.0;

                // Sample up to 256 candidate thresholds for efficiency
                let step = (all_vals.len() / 256).max(1);
                for i in (0..all_vals.len() - 1).step_by(step) {
                    let thr = (all_vals[i] + all_vals[i + 1]) / 2.0;
                    let mut total_gain = 0.0;

                    for bucket in &buckets {
                        let (lg, lh, rg, rh) = bucket.iter().fold(
                            (0.0, 0.0, 0.0, 0.0),
                            |(lg, lh, rg, rh), &idx| {
                                if x[[idx, feat]] <= thr {
                                    (lg + gradients[idx], lh + hessians[idx], rg, rh)
                                } else {
                                    (lg, lh, rg + gradients[idx], rh + hessians[idx])
                                }
                            },
                        );
                        let parent_g = lg + rg;
                        let parent_h = lh + rh;
                        let parent_score = parent_g * parent_g / (parent_h + reg_lambda);
                        let left_score = lg * lg / (lh + reg_lambda);
                        let right_score = rg * rg / (rh + reg_lambda);
                        total_gain += left_score + right_score - parent_score;
                    }

                    total_gain += score_noise[feat] * total_gain.abs();

                    if total_gain > best_gain {
                        best_gain = total_gain;
                        best_thr = thr;
                    }
                }

                if best_gain > 0.0 {
                    Some((feat, best_thr, best_gain))
                } else {
                    None
                }
            })
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((feat, thr, _)) => {
                splits.push((feat, thr));
                let mut new_buckets = Vec::with_capacity(buckets.len() * 2);
                for bucket in &buckets {
                    let (left, right): (Vec<usize>, Vec<usize>) =
                        bucket.iter().partition(|&&i| x[[i, feat]] <= thr);
                    new_buckets.push(left);
                    new_buckets.push(right);
                }
                buckets = new_buckets;
            }
            None => break,
        }
    }

    let leaf_values: Vec<f64> = buckets
        .iter()
        .map(|bucket| {
            if bucket.is_empty() {
                return 0.0;
            }
            let g: f64 = bucket.iter().map(|&i| gradients[i]).sum();
            let h: f64 = bucket.iter().map(|&i| hessians[i]).sum();
            -g / (h + reg_lambda)
        })
        .collect();

    SymmetricTree { splits, leaf_values }
}

/// CatBoost-style regressor (squared error loss)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostRegressor {
    pub config: CatBoostConfig,
    trees: Vec<SymmetricTree>,
    base_prediction: f64,
}

impl CatBoostRegressor {
    pub fn new(config: CatBoostConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_prediction: 0.0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(BenchError::Training("empty dataset".into()));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));
        self.trees.clear();
        self.base_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n, self.base_prediction);

        for _ in 0..self.config.n_estimators {
            let mut gradients: Vec<f64> =
                predictions.iter().zip(y.iter()).map(|(&p, &yi)| p - yi).collect();
            let mut hessians: Vec<f64> = vec![1.0; n];

            // Bayesian bootstrap: w = (-ln u)^t
            if self.config.bagging_temperature > 0.0 {
                for i in 0..n {
                    let u: f64 = rng.gen_range(1e-12..1.0);
                    let w = (-u.ln()).powf(self.config.bagging_temperature);
                    gradients[i] *= w;
                    hessians[i] *= w;
                }
            }

            let indices: Vec<usize> = if self.config.subsample < 1.0 {
                let k = (n as f64 * self.config.subsample).ceil() as usize;
                let mut sub: Vec<usize> = (0..n).collect();
                sub.shuffle(&mut rng);
                sub.truncate(k);
                sub
            } else {
                (0..n).collect()
            };

            let tree =
                build_symmetric_tree(x, &gradients, &hessians, &indices, &self.config, &mut rng);

            for i in 0..n {
                predictions[i] +=
                    self.config.learning_rate * tree.predict(x.row(i).as_slice().unwrap());
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(Array1::from_vec(
            x.rows()
                .into_iter()
                .map(|row| {
                    let s = row.as_slice().unwrap();
                    self.base_prediction
                        + self
                            .trees
                            .iter()
                            .map(|t| self.config.learning_rate * t.predict(s))
                            .sum::<f64>()
                })
                .collect(),
        ))
    }
}
