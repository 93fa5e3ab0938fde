//! XGBoost-style gradient boosting with second-order approximation
//!
//! - Regularized leaf weights: w* = -G / (H + lambda)
//! - Gain-based split scoring with a gamma threshold
//! - Built-in L1 (alpha) and L2 (lambda) regularization
//! - Minimum child weight constraint

use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XgBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub random_state: Option<u64>,
}

impl Default for XgBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: Some(42),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum XgbNode {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<XgbNode>,
        right: Box<XgbNode>,
    },
}

impl XgbNode {
    fn predict(&self, sample: &[f64]) -> f64 {
        match self {
            XgbNode::Leaf { weight } => *weight,
            XgbNode::Split { feature, threshold, left, right } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }
}

/// Optimal leaf weight with L1 (alpha) and L2 (lambda) regularization
fn compute_leaf_weight(g_sum: f64, h_sum: f64, lambda: f64, alpha: f64) -> f64 {
    if alpha > 0.0 {
        // Soft-threshold for L1
        let g_adj = if g_sum > alpha {
            g_sum - alpha
        } else if g_sum < -alpha {
            g_sum + alpha
        } else {
            return 0.0;
        };
        -g_adj / (h_sum + lambda)
    } else {
        -g_sum / (h_sum + lambda)
    }
}

/// Find the best split for a single feature using exact greedy enumeration
fn find_best_split_for_feature(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    indices: &[usize],
    feature: usize,
    config: &XgBoostConfig,
) -> Option<(usize, f64, f64)> {
    let mut sorted_indices: Vec<usize> = indices.to_vec();
    sorted_indices.sort_by(|&a, &b| {
        x[[a, feature]]
            .partial_cmp(&x[[b, feature]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let g_total: f64 = sorted_indices.iter().map(|&i| grad[i]).sum();
    let h_total: f64 = sorted_indices.iter().map(|&i| hess[i]).sum();

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best_gain = f64::NEG_INFINITY;
    let mut best_threshold = 0.0;

    let lambda = config.reg_lambda;

    for (pos, &idx) in sorted_indices.iter().enumerate() {
        g_left += grad[idx];
        h_left += hess[idx];

        // Skip duplicated feature values (identical split point)
        if pos + 1 < sorted_indices.len() {
            let next_idx = sorted_indices[pos + 1];
            if (x[[idx, feature]] - x[[next_idx, feature]]).abs() < 1e-12 {
                continue;
            }
        } else {
            break;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;

        if h_left < config.min_child_weight || h_right < config.min_child_weight {
            continue;
        }

        let gain = 0.5
            * ((g_left * g_left) / (h_left + lambda)
                + (g_right * g_right) / (h_right + lambda)
                - (g_total * g_total) / (h_total + lambda));

        if gain > best_gain {
            best_gain = gain;
            let next_idx = sorted_indices[pos + 1];
            best_threshold = (x[[idx, feature]] + x[[next_idx, feature]]) / 2.0;
        }
    }

    if best_gain > f64::NEG_INFINITY {
        Some((feature, best_threshold, best_gain))
    } else {
        None
    }
}

/// Build a tree using exact greedy split finding, level by level
fn build_xgb_tree(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    indices: &[usize],
    feature_indices: &[usize],
    depth: usize,
    config: &XgBoostConfig,
) -> XgbNode {
    let n = indices.len();

    let g_sum: f64 = indices.iter().map(|&i| grad[i]).sum();
    let h_sum: f64 = indices.iter().map(|&i| hess[i]).sum();
    let leaf_weight = compute_leaf_weight(g_sum, h_sum, config.reg_lambda, config.reg_alpha);

    if depth >= config.max_depth || n < 2 || h_sum < config.min_child_weight {
        return XgbNode::Leaf { weight: leaf_weight };
    }

    let best_split = feature_indices
        .par_iter()
        .filter_map(|&f| find_best_split_for_feature(x, grad, hess, indices, f, config))
        .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    match best_split {
        Some((feature, threshold, gain)) if gain > config.gamma => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
                indices.iter().partition(|&&i| x[[i, feature]] <= threshold);

            if left_idx.is_empty() || right_idx.is_empty() {
                return XgbNode::Leaf { weight: leaf_weight };
            }

            let left = build_xgb_tree(x, grad, hess, &left_idx, feature_indices, depth + 1, config);
            let right = build_xgb_tree(x, grad, hess, &right_idx, feature_indices, depth + 1, config);

            XgbNode::Split {
                feature,
                threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        _ => XgbNode::Leaf { weight: leaf_weight },
    }
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, fraction: f64) -> Vec<usize> {
    if fraction >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64 * fraction).ceil() as usize).max(1);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices
}

/// XGBoost-style regressor (squared error loss)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XgBoostRegressor {
    pub config: XgBoostConfig,
    trees: Vec<XgbNode>,
    base_score: f64,
}

impl XgBoostRegressor {
    pub fn new(config: XgBoostConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_score: 0.0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 {
            return Err(BenchError::Training("empty dataset".into()));
        }

        self.base_score = y.mean().unwrap_or(0.0);
        let mut preds = Array1::from_elem(n_samples, self.base_score);

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        self.trees.clear();

        for _ in 0..self.config.n_estimators {
            // Squared error: grad = pred - y, hess = 1.0
            let grad: Array1<f64> = &preds - y;
            let hess = Array1::from_elem(n_samples, 1.0);

            let row_indices = subsample(&mut rng, n_samples, self.config.subsample);
            let col_indices = subsample(&mut rng, n_features, self.config.colsample_bytree);

            let tree = build_xgb_tree(x, &grad, &hess, &row_indices, &col_indices, 0, &self.config);

            for i in 0..n_samples {
                preds[i] += self.config.learning_rate * tree.predict(x.row(i).as_slice().unwrap());
            }

            self.trees.push(tree);
        }

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let n = x.nrows();
        let mut preds = Array1::from_elem(n, self.base_score);
        for i in 0..n {
            let sample = x.row(i);
            let s = sample.as_slice().unwrap();
            for tree in &self.trees {
                preds[i] += self.config.learning_rate * tree.predict(s);
            }
        }
        Ok(preds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::r2_score;

    fn make_regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((120, 2), (0..240).map(|i| (i % 40) as f64 / 4.0).collect())
            .unwrap();
        let y = Array1::from_vec(
            (0..120)
                .map(|i| {
                    let x0 = ((i * 2) % 40) as f64 / 4.0;
                    3.0 * x0 - 1.0
                })
                .collect(),
        );
        (x, y)
    }

    #[test]
    fn test_xgboost_regressor_fits_linear_target() {
        let (x, y) = make_regression_data();
        let config = XgBoostConfig {
            n_estimators: 30,
            max_depth: 4,
            ..Default::default()
        };
        let mut model = XgBoostRegressor::new(config);
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        assert!(r2_score(&y, &preds) > 0.9);
    }

    #[test]
    fn test_xgboost_gamma_prunes() {
        let (x, y) = make_regression_data();
        let config = XgBoostConfig {
            n_estimators: 5,
            gamma: f64::INFINITY,
            ..Default::default()
        };
        let mut model = XgBoostRegressor::new(config);
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        let first = preds[0];
        assert!(preds.iter().all(|&p| (p - first).abs() < 1e-9));
    }

    #[test]
    fn test_xgboost_subsampling() {
        let (x, y) = make_regression_data();
        let config = XgBoostConfig {
            n_estimators: 10,
            subsample: 0.7,
            colsample_bytree: 0.5,
            ..Default::default()
        };
        let mut model = XgBoostRegressor::new(config);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap().len(), 120);
    }

    #[test]
    fn test_xgboost_empty_input_fails() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        let mut model = XgBoostRegressor::new(XgBoostConfig::default());
        assert!(matches!(model.fit(&x, &y), Err(BenchError::Training(_))));
    }

    #[test]
    fn test_xgboost_deterministic_with_seed() {
        let (x, y) = make_regression_data();
        let config = XgBoostConfig {
            n_estimators: 10,
            subsample: 0.8,
            random_state: Some(11),
            ..Default::default()
        };
        let mut a = XgBoostRegressor::new(config.clone());
        let mut b = XgBoostRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }
}
