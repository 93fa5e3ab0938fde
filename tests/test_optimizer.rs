//! Integration test: hyperparameter selectors

use boostbench::optimizer::{GpSelector, GridSelector, TpeSelector};
use boostbench::training::Model;
use ndarray::{Array1, Array2};

fn synthetic_regression(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 2), |(r, c)| {
        if c == 0 {
            (r % 11) as f64
        } else {
            ((r * 3) % 7) as f64
        }
    });
    let y = Array1::from_shape_fn(n, |i| x[[i, 0]] * 1.5 + x[[i, 1]] * 0.5);
    (x, y)
}

#[test]
fn test_tpe_selector_fits_and_predicts() {
    let (x, y) = synthetic_regression(60);

    // Small budget: a couple of random startup trials
    let mut selector = TpeSelector::new(2, 2).with_seed(42);
    selector.fit(&x, &y).unwrap();

    assert!(selector.best_family().is_some());
    assert!(selector.best_score().unwrap().is_finite());
    assert!(!selector.best_params().is_empty());

    let preds = selector.predict(&x).unwrap();
    assert_eq!(preds.len(), 60);
    assert!(preds.iter().all(|p| p.is_finite()));
}

#[test]
fn test_tpe_selector_uses_model_phase_after_startup() {
    let (x, y) = synthetic_regression(60);

    // Enough trials to get past the startup phase and exercise the KDE path
    let mut selector = TpeSelector::new(2, 8).with_seed(1).with_n_startup(4);
    selector.fit(&x, &y).unwrap();
    assert!(selector.best_score().unwrap().is_finite());
}

#[test]
fn test_gp_selector_fits_and_predicts() {
    let (x, y) = synthetic_regression(60);

    let mut selector = GpSelector::new(2, 3).with_seed(42).with_n_startup(2);
    selector.fit(&x, &y).unwrap();

    assert!(selector.best_family().is_some());
    let preds = selector.predict(&x).unwrap();
    assert_eq!(preds.len(), 60);
    assert!(preds.iter().all(|p| p.is_finite()));
}

#[test]
fn test_grid_selector_with_zero_steps_scores_defaults() {
    let (x, y) = synthetic_regression(60);

    // steps = 0 compares the three families on default configs only
    let mut selector = GridSelector::new(2, 0).with_seed(42);
    selector.fit(&x, &y).unwrap();

    assert!(selector.best_family().is_some());
    assert!(selector.best_params().is_empty());
    assert!(selector.best_score().unwrap().is_finite());

    let preds = selector.predict(&x).unwrap();
    assert_eq!(preds.len(), 60);
}

#[test]
fn test_selectors_are_deterministic_given_a_seed() {
    let (x, y) = synthetic_regression(60);

    let run = || {
        let mut selector = TpeSelector::new(2, 3).with_seed(9);
        selector.fit(&x, &y).unwrap();
        (selector.best_family(), selector.best_score())
    };

    assert_eq!(run(), run());
}
