//! Train/test splitting

use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Shuffled train/test split with a fixed seed.
///
/// Returns `(x_train, x_test, y_train, y_test)`.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    let n = x.nrows();
    if n != y.len() {
        return Err(BenchError::Data(format!(
            "feature/target length mismatch: {n} vs {}",
            y.len()
        )));
    }
    if !(0.0..1.0).contains(&test_size) {
        return Err(BenchError::Configuration(format!(
            "test_size must be in [0, 1): {test_size}"
        )));
    }

    let n_test = ((n as f64) * test_size).round() as usize;
    let n_train = n - n_test;
    if n_train == 0 || n_test == 0 {
        return Err(BenchError::Data(format!(
            "split of {n} rows at {test_size} leaves an empty side"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (train_idx, test_idx) = indices.split_at(n_train);

    let x_train = x.select(Axis(0), train_idx);
    let x_test = x.select(Axis(0), test_idx);
    let y_train = y.select(Axis(0), train_idx);
    let y_test = y.select(Axis(0), test_idx);

    Ok((x_train, x_test, y_train, y_test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(r, c)| (r * 2 + c) as f64);
        let y = Array1::from_shape_fn(n, |i| i as f64);
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = make_data(10);
        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(x_train.nrows(), 8);
        assert_eq!(x_test.nrows(), 2);
        assert_eq!(y_train.len(), 8);
        assert_eq!(y_test.len(), 2);
    }

    #[test]
    fn test_rows_stay_aligned() {
        let (x, y) = make_data(20);
        let (x_train, _, y_train, _) = train_test_split(&x, &y, 0.25, 0).unwrap();
        // y was built as the row index, so each x row must still start at 2*y
        for (row, &target) in x_train.rows().into_iter().zip(y_train.iter()) {
            assert_eq!(row[0], target * 2.0);
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let (x, y) = make_data(30);
        let a = train_test_split(&x, &y, 0.2, 42).unwrap();
        let b = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(a.1, b.1);
        assert_eq!(a.3, b.3);
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let x = Array2::<f64>::zeros((5, 2));
        let y = Array1::<f64>::zeros(4);
        assert!(matches!(
            train_test_split(&x, &y, 0.2, 42),
            Err(BenchError::Data(_))
        ));
    }

    #[test]
    fn test_degenerate_split_fails() {
        let (x, y) = make_data(3);
        assert!(train_test_split(&x, &y, 0.01, 42).is_err());
    }
}
