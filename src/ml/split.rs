use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};

/// Disjoint train/test row indices covering `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Seeded random partition of `n_samples` rows.
///
/// The test side gets `ceil(n_samples * test_size - 1e-9)` rows taken from
/// the front of a seeded permutation, the train side the rest. The small
/// allowance makes this differ from a plain `ceil` when the product lands a
/// rounding error above an integer: 15 rows at 0.2 hold out 3, where a plain
/// `ceil(15 * 0.2)` gives 4. The same `n_samples`, `test_size` and `seed`
/// always give the same partition.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(Error::InvalidSplit {
            samples: n_samples,
            test_size,
        });
    }
    if n_samples == 0 {
        return Err(Error::EmptyDataset);
    }

    // Absorb float noise such as 15 * 0.2 = 3.0000000000000004.
    let n_test = (n_samples as f64 * test_size - 1e-9).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_train == 0 || n_test == 0 {
        return Err(Error::InvalidSplit {
            samples: n_samples,
            test_size,
        });
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}
