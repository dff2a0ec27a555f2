// ============================================================
// Layer 4 - K-Fold Splitter
// ============================================================
// Partitions N training rows into K folds. Each fold holds out
// one contiguous block of rows for validation and trains on
// everything else:
//
//   N = 10, K = 5
//   fold 0: val [0,1]  train [2..10]
//   fold 1: val [2,3]  train [0,1,4..10]
//   ...
//   fold 4: val [8,9]  train [0..8]
//
// Fold sizes: every fold gets N / K validation rows and the
// first N % K folds get one extra, so sizes differ by at most
// one. With N = 11, K = 5 the sizes are [3, 2, 2, 2, 2].
//
// Invariant: every row index appears in exactly one validation
// set, and in the training set of every other fold.
//
// By default the split is a pure function of row order. An
// optional seeded shuffle permutes the order before the blocks
// are cut; the same seed always gives the same folds.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// One train/validation partition of the row indices.
/// Both index lists are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub index:         usize,
    pub train_indices: Vec<usize>,
    pub val_indices:   Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    shuffle:  Option<u64>,
}

impl KFold {
    /// A splitter with `n_splits` folds; at least 2 are needed
    /// for every fold to have training data.
    pub fn new(n_splits: usize) -> Result<Self> {
        ensure!(n_splits >= 2, "k-fold needs at least 2 splits, got {n_splits}");
        Ok(Self { n_splits, shuffle: None })
    }

    /// Shuffle row order with the given seed before splitting
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle = Some(seed);
        self
    }

    /// Compute all folds for a table of `n_rows` rows.
    pub fn split(&self, n_rows: usize) -> Result<Vec<Fold>> {
        ensure!(
            n_rows >= self.n_splits,
            "cannot split {n_rows} rows into {} folds: need at least one row per fold",
            self.n_splits
        );

        let mut order: Vec<usize> = (0..n_rows).collect();
        if let Some(seed) = self.shuffle {
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }

        let base  = n_rows / self.n_splits;
        let extra = n_rows % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0usize;

        for index in 0..self.n_splits {
            let size = base + usize::from(index < extra);
            let end  = start + size;

            let mut in_val = vec![false; n_rows];
            let mut val_indices: Vec<usize> = order[start..end].to_vec();
            for &i in &val_indices {
                in_val[i] = true;
            }
            val_indices.sort_unstable();

            let train_indices: Vec<usize> = (0..n_rows).filter(|&i| !in_val[i]).collect();

            tracing::debug!(
                "Fold {}: {} train, {} validation",
                index,
                train_indices.len(),
                val_indices.len()
            );

            folds.push(Fold { index, train_indices, val_indices });
            start = end;
        }

        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_partition(folds: &[Fold], n: usize) {
        let mut seen = vec![0usize; n];
        for f in folds {
            for &i in &f.val_indices {
                seen[i] += 1;
            }
            // train and validation are complementary within a fold
            let val: HashSet<_>   = f.val_indices.iter().collect();
            let train: HashSet<_> = f.train_indices.iter().collect();
            assert!(val.is_disjoint(&train));
            assert_eq!(val.len() + train.len(), n);
        }
        // every row validated exactly once
        assert!(seen.iter().all(|&c| c == 1), "coverage: {seen:?}");
    }

    #[test]
    fn test_ten_rows_five_folds() {
        let folds = KFold::new(5).unwrap().split(10).unwrap();
        assert_eq!(folds.len(), 5);
        for (k, f) in folds.iter().enumerate() {
            assert_eq!(f.index, k);
            assert_eq!(f.val_indices, vec![2 * k, 2 * k + 1]);
            assert_eq!(f.train_indices.len(), 8);
        }
        assert_partition(&folds, 10);
    }

    #[test]
    fn test_uneven_sizes_front_loaded() {
        let folds = KFold::new(5).unwrap().split(11).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.val_indices.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2, 2, 2]);
        assert_partition(&folds, 11);
    }

    #[test]
    fn test_partition_holds_for_many_shapes() {
        for k in 2..7 {
            for n in k..40 {
                let folds = KFold::new(k).unwrap().split(n).unwrap();
                assert_eq!(folds.len(), k);
                assert_partition(&folds, n);
            }
        }
    }

    #[test]
    fn test_n_equal_k_gives_singleton_folds() {
        let folds = KFold::new(3).unwrap().split(3).unwrap();
        assert!(folds.iter().all(|f| f.val_indices.len() == 1));
    }

    #[test]
    fn test_more_folds_than_rows_is_an_error() {
        assert!(KFold::new(5).unwrap().split(4).is_err());
    }

    #[test]
    fn test_single_split_is_rejected() {
        assert!(KFold::new(1).is_err());
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let a = KFold::new(4).unwrap().with_shuffle(7).split(20).unwrap();
        let b = KFold::new(4).unwrap().with_shuffle(7).split(20).unwrap();
        assert_eq!(a, b);
        assert_partition(&a, 20);
        // shuffled folds are no longer contiguous blocks
        let plain = KFold::new(4).unwrap().split(20).unwrap();
        assert_ne!(a, plain);
    }
}
