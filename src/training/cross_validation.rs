//! K-fold cross-validation

use crate::error::{BenchError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Shuffled k-fold splitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidator {
    n_splits: usize,
    random_state: Option<u64>,
}

impl CrossValidator {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate the fold index sets for `n_samples` rows.
    pub fn split(&self, n_samples: usize) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(BenchError::Configuration(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < self.n_splits {
            return Err(BenchError::Data(format!(
                "n_samples ({n_samples}) must be >= n_splits ({})",
                self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        indices.shuffle(&mut rng);

        let fold_sizes: Vec<usize> = (0..self.n_splits)
            .map(|i| {
                let base = n_samples / self.n_splits;
                let remainder = n_samples % self.n_splits;
                if i < remainder {
                    base + 1
                } else {
                    base
                }
            })
            .collect();

        let mut splits = Vec::with_capacity(self.n_splits);
        let mut current = 0;

        for (fold_idx, &fold_size) in fold_sizes.iter().enumerate() {
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CvSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current += fold_size;
        }

        Ok(splits)
    }
}
