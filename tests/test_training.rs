//! Integration test: boosting regressors on synthetic data

use boostbench::training::{
    r2_score, train_test_split, CatBoostConfig, CatBoostRegressor, LightGbmConfig,
    LightGbmRegressor, XgBoostConfig, XgBoostRegressor,
};
use ndarray::{Array1, Array2};

/// y = 2*x0 - x1 + noise-free
fn synthetic_regression(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 2), |(r, c)| {
        let base = (r % 17) as f64 / 3.0;
        if c == 0 {
            base
        } else {
            ((r * 7) % 13) as f64 / 5.0
        }
    });
    let y = Array1::from_shape_fn(n, |i| 2.0 * x[[i, 0]] - x[[i, 1]]);
    (x, y)
}

#[test]
fn test_all_three_regressors_fit_held_out_data() {
    let (x, y) = synthetic_regression(120);
    let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.2, 42).unwrap();

    let mut lgbm = LightGbmRegressor::new(LightGbmConfig {
        n_estimators: 50,
        min_child_samples: 3,
        ..Default::default()
    });
    lgbm.fit(&x_train, &y_train).unwrap();
    let lgbm_r2 = r2_score(&y_test, &lgbm.predict(&x_test).unwrap());

    let mut xgb = XgBoostRegressor::new(XgBoostConfig {
        n_estimators: 50,
        ..Default::default()
    });
    xgb.fit(&x_train, &y_train).unwrap();
    let xgb_r2 = r2_score(&y_test, &xgb.predict(&x_test).unwrap());

    let mut cat = CatBoostRegressor::new(CatBoostConfig {
        n_estimators: 50,
        ..Default::default()
    });
    cat.fit(&x_train, &y_train).unwrap();
    let cat_r2 = r2_score(&y_test, &cat.predict(&x_test).unwrap());

    assert!(lgbm_r2 > 0.5, "lgbm R² too low: {lgbm_r2}");
    assert!(xgb_r2 > 0.8, "xgb R² too low: {xgb_r2}");
    assert!(cat_r2 > 0.8, "cat R² too low: {cat_r2}");
}

#[test]
fn test_prediction_lengths_match_input() {
    let (x, y) = synthetic_regression(60);

    let mut model = XgBoostRegressor::new(XgBoostConfig {
        n_estimators: 10,
        ..Default::default()
    });
    model.fit(&x, &y).unwrap();

    let narrow = x.slice(ndarray::s![..7, ..]).to_owned();
    assert_eq!(model.predict(&narrow).unwrap().len(), 7);
}

#[test]
fn test_split_then_fit_is_reproducible() {
    let (x, y) = synthetic_regression(80);

    let run = || {
        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.2, 42).unwrap();
        let mut model = CatBoostRegressor::new(CatBoostConfig {
            n_estimators: 20,
            random_state: Some(42),
            ..Default::default()
        });
        model.fit(&x_train, &y_train).unwrap();
        r2_score(&y_test, &model.predict(&x_test).unwrap())
    };

    assert_eq!(run(), run(), "fixed seeds should give identical scores");
}
