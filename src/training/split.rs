//! Seeded train / holdout split

use crate::error::{PricingError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` with `seed` and hold out `ceil(n_rows * test_size)` rows.
///
/// Both partitions must be non-empty.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    let n_test = (n_rows as f64 * test_size).ceil() as usize;

    if n_test == 0 || n_test >= n_rows {
        return Err(PricingError::TrainingError(format!(
            "cannot split {} rows with test_size {}: both partitions need at least one row",
            n_rows, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(TrainTestSplit { train, test: indices })
}
