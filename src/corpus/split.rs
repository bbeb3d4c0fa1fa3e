//! Seeded shuffling and train/test splitting.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};

/// Default fraction of samples held out for evaluation.
pub const DEFAULT_TEST_SIZE: f64 = 0.4;

/// Default random seed.
pub const DEFAULT_SEED: u64 = 42;

/// Items partitioned into a training and a held-out test part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTestSplit<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Shuffle `items` in place; the same seed always gives the same order.
pub fn shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
}

/// Number of test samples for `n` items: `ceil(n * test_size)`.
pub fn test_count(n: usize, test_size: f64) -> usize {
    (n as f64 * test_size).ceil() as usize
}

/// Randomly partition `items`.
///
/// The items are permuted with a generator seeded by `seed`; the first
/// `ceil(n * test_size)` become the test part, the rest the training part.
/// Both parts must end up non-empty.
pub fn train_test_split<T>(
    mut items: Vec<T>,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit<T>> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(VerityError::invalid_config(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let n = items.len();
    let n_test = test_count(n, test_size);
    if n_test == 0 || n_test >= n {
        return Err(VerityError::training(format!(
            "cannot split {n} samples with test_size {test_size}: train and test sets must both be non-empty"
        )));
    }

    shuffle(&mut items, seed);
    let train = items.split_off(n_test);

    Ok(TrainTestSplit { train, test: items })
}
