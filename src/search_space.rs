//! Hyperparameter search-space definitions
//!
//! Static, declarative parameter domains per model family, one set per
//! optimization back-end: staged discrete grids for the grid selector,
//! quantized/log-uniform domains for the TPE selector, and continuous
//! bounded domains for the GP selector. All three constructors are pure
//! functions of their family flags; output order is lgbm, then xgb, then
//! cat when all flags are set.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Gradient-boosting model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    LightGbm,
    XgBoost,
    CatBoost,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::LightGbm => "lgbm",
            ModelFamily::XgBoost => "xgb",
            ModelFamily::CatBoost => "cat",
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling domain of one hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Domain {
    /// Uniform over low..=high, quantized to multiples of `q`
    QUniform { low: f64, high: f64, q: f64 },
    /// Continuous uniform over low..=high
    Uniform { low: f64, high: f64 },
    /// Log-uniform over low..=high
    LogUniform { low: f64, high: f64 },
    /// Uniform integer over low..=high
    Integer { low: i64, high: i64 },
}

impl Domain {
    /// Draw one value from the domain.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Domain::QUniform { low, high, q } => {
                let steps = ((high - low) / q).floor() as i64;
                let k = rng.gen_range(0..=steps);
                low + k as f64 * q
            }
            Domain::Uniform { low, high } => rng.gen_range(low..=high),
            Domain::LogUniform { low, high } => {
                rng.gen_range(low.ln()..=high.ln()).exp()
            }
            Domain::Integer { low, high } => rng.gen_range(low..=high) as f64,
        }
    }

    /// Lower bound in external (untransformed) space.
    pub fn low(&self) -> f64 {
        match *self {
            Domain::QUniform { low, .. }
            | Domain::Uniform { low, .. }
            | Domain::LogUniform { low, .. } => low,
            Domain::Integer { low, .. } => low as f64,
        }
    }

    /// Upper bound in external (untransformed) space.
    pub fn high(&self) -> f64 {
        match *self {
            Domain::QUniform { high, .. }
            | Domain::Uniform { high, .. }
            | Domain::LogUniform { high, .. } => high,
            Domain::Integer { high, .. } => high as f64,
        }
    }

    /// Whether candidates should be compared in log space.
    pub fn is_log(&self) -> bool {
        matches!(self, Domain::LogUniform { .. })
    }

    /// Snap a raw value back into the domain (bounds, quantization,
    /// integrality).
    pub fn project(&self, value: f64) -> f64 {
        match *self {
            Domain::QUniform { low, high, q } => {
                let snapped = low + ((value - low) / q).round() * q;
                snapped.clamp(low, high)
            }
            Domain::Uniform { low, high } | Domain::LogUniform { low, high } => {
                value.clamp(low, high)
            }
            Domain::Integer { low, high } => {
                value.round().clamp(low as f64, high as f64)
            }
        }
    }
}

/// One named hyperparameter and its domain
#[derive(Debug, Clone, Serialize)]
pub struct ParamDef {
    pub name: &'static str,
    pub domain: Domain,
}

impl ParamDef {
    fn new(name: &'static str, domain: Domain) -> Self {
        Self { name, domain }
    }
}

/// A model family's distribution-based search space
#[derive(Debug, Clone, Serialize)]
pub struct FamilySpace {
    pub family: ModelFamily,
    pub params: Vec<ParamDef>,
}

/// One stage of a staged grid: a small cartesian product over 1–2 parameters
#[derive(Debug, Clone, Serialize)]
pub struct GridStage {
    pub params: Vec<(&'static str, Vec<f64>)>,
}

/// A model family's staged grid
#[derive(Debug, Clone, Serialize)]
pub struct GridSpace {
    pub family: ModelFamily,
    pub stages: Vec<GridStage>,
}

fn range_f64(start: i64, stop: i64, step: i64) -> Vec<f64> {
    (start..stop).step_by(step as usize).map(|v| v as f64).collect()
}

fn stage(params: Vec<(&'static str, Vec<f64>)>) -> GridStage {
    GridStage { params }
}

const LEARNING_RATE_LADDER: [f64; 9] = [0.001, 0.01, 0.1, 0.2, 0.3, 0.4, 0.5, 0.7, 0.9];
const L2_LADDER: [f64; 5] = [1e-5, 1e-2, 0.1, 1.0, 100.0];

/// Staged discrete grids for the grid selector.
pub fn grid_spaces(lgbm: bool, xgb: bool, cat: bool) -> Vec<GridSpace> {
    let mut spaces = Vec::new();

    if lgbm {
        spaces.push(GridSpace {
            family: ModelFamily::LightGbm,
            stages: vec![
                stage(vec![("n_estimators", range_f64(50, 1000, 25))]),
                stage(vec![("learning_rate", LEARNING_RATE_LADDER.to_vec())]),
                stage(vec![
                    ("max_depth", range_f64(3, 10, 2)),
                    ("num_leaves", range_f64(10, 150, 20)),
                ]),
                stage(vec![("colsample_bytree", vec![0.6, 0.7, 0.8, 0.9])]),
                stage(vec![
                    ("reg_lambda", L2_LADDER.to_vec()),
                    ("reg_alpha", L2_LADDER.to_vec()),
                ]),
                stage(vec![("min_split_gain", vec![0.0001, 0.001, 0.01, 0.1])]),
            ],
        });
    }

    if xgb {
        spaces.push(GridSpace {
            family: ModelFamily::XgBoost,
            stages: vec![
                stage(vec![("n_estimators", range_f64(50, 1000, 25))]),
                stage(vec![("learning_rate", LEARNING_RATE_LADDER.to_vec())]),
                stage(vec![
                    ("max_depth", range_f64(3, 10, 2)),
                    (
                        "min_child_weight",
                        (0..11).map(|i| 0.5 + 0.5 * i as f64).collect(),
                    ),
                ]),
                stage(vec![("gamma", vec![0.0, 0.1, 0.2, 0.3, 0.4])]),
                stage(vec![
                    ("subsample", vec![0.6, 0.7, 0.8, 0.9]),
                    ("colsample_bytree", vec![0.6, 0.7, 0.8, 0.9]),
                ]),
                stage(vec![("reg_alpha", L2_LADDER.to_vec())]),
            ],
        });
    }

    if cat {
        spaces.push(GridSpace {
            family: ModelFamily::CatBoost,
            stages: vec![
                stage(vec![("n_estimators", range_f64(50, 1000, 25))]),
                stage(vec![("learning_rate", LEARNING_RATE_LADDER.to_vec())]),
                stage(vec![("depth", range_f64(3, 10, 2))]),
                stage(vec![("l2_leaf_reg", L2_LADDER.to_vec())]),
            ],
        });
    }

    spaces
}

/// Quantized/log-uniform domains for the TPE selector.
pub fn tpe_spaces(lgbm: bool, xgb: bool, cat: bool) -> Vec<FamilySpace> {
    let mut spaces = Vec::new();

    if lgbm {
        spaces.push(FamilySpace {
            family: ModelFamily::LightGbm,
            params: vec![
                ParamDef::new("learning_rate", Domain::LogUniform { low: 0.001, high: 0.3 }),
                ParamDef::new("n_estimators", Domain::QUniform { low: 50.0, high: 1200.0, q: 25.0 }),
                ParamDef::new("max_depth", Domain::QUniform { low: 1.0, high: 15.0, q: 1.0 }),
                ParamDef::new("num_leaves", Domain::QUniform { low: 10.0, high: 150.0, q: 1.0 }),
                ParamDef::new("feature_fraction", Domain::Uniform { low: 0.3, high: 1.0 }),
                ParamDef::new("reg_lambda", Domain::Uniform { low: 0.0, high: 1.0 }),
                ParamDef::new("reg_alpha", Domain::Uniform { low: 0.0, high: 1.0 }),
                ParamDef::new("min_split_gain", Domain::Uniform { low: 0.0001, high: 0.1 }),
            ],
        });
    }

    if xgb {
        spaces.push(FamilySpace {
            family: ModelFamily::XgBoost,
            params: vec![
                ParamDef::new("n_estimators", Domain::QUniform { low: 50.0, high: 1000.0, q: 25.0 }),
                ParamDef::new("max_depth", Domain::QUniform { low: 1.0, high: 12.0, q: 1.0 }),
                ParamDef::new("min_child_weight", Domain::QUniform { low: 1.0, high: 6.0, q: 1.0 }),
                ParamDef::new("gamma", Domain::QUniform { low: 0.5, high: 1.0, q: 0.05 }),
                ParamDef::new("subsample", Domain::QUniform { low: 0.5, high: 1.0, q: 0.05 }),
                ParamDef::new("learning_rate", Domain::LogUniform { low: 0.001, high: 0.3 }),
                ParamDef::new("colsample_bytree", Domain::QUniform { low: 0.5, high: 1.0, q: 0.1 }),
            ],
        });
    }

    if cat {
        spaces.push(FamilySpace {
            family: ModelFamily::CatBoost,
            params: vec![
                ParamDef::new("n_estimators", Domain::QUniform { low: 50.0, high: 1025.0, q: 25.0 }),
                ParamDef::new("learning_rate", Domain::LogUniform { low: 0.005, high: 0.3 }),
                ParamDef::new("depth", Domain::QUniform { low: 1.0, high: 16.0, q: 1.0 }),
                ParamDef::new("l2_leaf_reg", Domain::QUniform { low: 1.0, high: 10.0, q: 1.0 }),
            ],
        });
    }

    spaces
}

/// Continuous bounded domains for the GP selector.
pub fn gp_spaces(lgbm: bool, xgb: bool, cat: bool) -> Vec<FamilySpace> {
    let mut spaces = Vec::new();

    if lgbm {
        spaces.push(FamilySpace {
            family: ModelFamily::LightGbm,
            params: vec![
                ParamDef::new("n_estimators", Domain::Integer { low: 50, high: 1000 }),
                ParamDef::new("learning_rate", Domain::LogUniform { low: 0.001, high: 0.9 }),
                ParamDef::new("max_depth", Domain::Integer { low: 3, high: 10 }),
                ParamDef::new("num_leaves", Domain::Integer { low: 10, high: 150 }),
                ParamDef::new("colsample_bytree", Domain::Uniform { low: 0.1, high: 1.0 }),
            ],
        });
    }

    if xgb {
        spaces.push(FamilySpace {
            family: ModelFamily::XgBoost,
            params: vec![
                ParamDef::new("n_estimators", Domain::Integer { low: 50, high: 1000 }),
                ParamDef::new("learning_rate", Domain::LogUniform { low: 0.001, high: 0.9 }),
                ParamDef::new("max_depth", Domain::Integer { low: 3, high: 10 }),
                ParamDef::new("min_child_weight", Domain::Uniform { low: 0.5, high: 6.0 }),
                ParamDef::new("gamma", Domain::Uniform { low: 0.1, high: 1.0 }),
                ParamDef::new("reg_alpha", Domain::LogUniform { low: 0.0001, high: 100.0 }),
            ],
        });
    }

    if cat {
        spaces.push(FamilySpace {
            family: ModelFamily::CatBoost,
            params: vec![
                ParamDef::new("n_estimators", Domain::Integer { low: 50, high: 1050 }),
                ParamDef::new("learning_rate", Domain::LogUniform { low: 0.001, high: 1.0 }),
                ParamDef::new("depth", Domain::Integer { low: 1, high: 10 }),
                ParamDef::new("random_strength", Domain::LogUniform { low: 1e-9, high: 10.0 }),
                ParamDef::new("bagging_temperature", Domain::Uniform { low: 0.0, high: 1.0 }),
            ],
        });
    }

    spaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_output_order_is_lgbm_xgb_cat() {
        let spaces = tpe_spaces(true, true, true);
        let families: Vec<ModelFamily> = spaces.iter().map(|s| s.family).collect();
        assert_eq!(
            families,
            vec![ModelFamily::LightGbm, ModelFamily::XgBoost, ModelFamily::CatBoost]
        );
    }

    #[test]
    fn test_family_flags_filter() {
        let spaces = gp_spaces(false, true, false);
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].family, ModelFamily::XgBoost);
        assert!(grid_spaces(false, false, false).is_empty());
    }

    #[test]
    fn test_param_names_unique_within_family() {
        for space in tpe_spaces(true, true, true)
            .into_iter()
            .chain(gp_spaces(true, true, true))
        {
            let mut names: Vec<&str> = space.params.iter().map(|p| p.name).collect();
            let before = names.len();
            names.sort();
            names.dedup();
            assert_eq!(before, names.len(), "duplicate name in {:?}", space.family);
        }
    }

    #[test]
    fn test_samples_stay_in_bounds() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for space in tpe_spaces(true, true, true) {
            for param in &space.params {
                for _ in 0..100 {
                    let v = param.domain.sample(&mut rng);
                    assert!(
                        v >= param.domain.low() - 1e-12 && v <= param.domain.high() + 1e-12,
                        "{} out of bounds: {v}",
                        param.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_quantization() {
        let domain = Domain::QUniform { low: 50.0, high: 1000.0, q: 25.0 };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        for _ in 0..50 {
            let v = domain.sample(&mut rng);
            assert_eq!((v - 50.0) % 25.0, 0.0);
        }
        assert_eq!(domain.project(101.0), 100.0);
        assert_eq!(domain.project(3.0), 50.0);
    }

    #[test]
    fn test_grid_stage_values() {
        let spaces = grid_spaces(true, true, true);
        let lgbm = &spaces[0];
        assert_eq!(lgbm.stages.len(), 6);
        // n_estimators: 50..1000 step 25
        assert_eq!(lgbm.stages[0].params[0].1.len(), 38);
        assert_eq!(lgbm.stages[0].params[0].1[0], 50.0);
        // cat has the short stage list
        let cat = &spaces[2];
        assert_eq!(cat.stages.len(), 4);
    }
}
