//! Stratified k-fold splitter used by hyperparameter selection

use crate::error::{Result, ValidatorError};
use crate::utils::{mean, std_dev};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter: every fold keeps the class proportions
#[derive(Debug, Clone)]
pub struct CrossValidator {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// `n_splits` folds, shuffled within each class
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: true,
            random_state: None,
        }
    }

    /// Keep the original example order inside each class
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Optional variant of [`Self::with_random_state`]
    pub fn with_optional_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate train/test splits over the labels `y`
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CVSplit>> {
        if self.n_splits < 2 {
            return Err(ValidatorError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if y.len() < self.n_splits {
            return Err(ValidatorError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                y.len(),
                self.n_splits
            )));
        }

        // Ordered by class so a seeded run always builds the same folds
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        if self.shuffle {
            let mut rng = match self.random_state {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        // Deal samples round-robin, continuing across classes so folds stay balanced in size
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut slot = 0;
        for indices in class_indices.values() {
            for &idx in indices {
                folds[slot % self.n_splits].push(idx);
                slot += 1;
            }
        }

        let mut splits = Vec::with_capacity(self.n_splits);
        for fold_idx in 0..self.n_splits {
            let test_indices = folds[fold_idx].clone();
            let train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
        }

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        Self {
            mean_score: mean(&scores),
            std_score: std_dev(&scores),
            n_folds: scores.len(),
            scores,
        }
    }
}
