//! src/data_loader/sampler.rs
//! Deterministic index permutations.
//!
//! `ShuffleSampler` yields `0..len` in a shuffled order fixed by its seed.
//! `random_split` uses it to carve a dataset into disjoint subsets.

use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::{RngCore, SeedableRng};

/// Yields all indices `0..len` in a deterministic shuffled order.
#[derive(Debug, Clone)]
pub struct ShuffleSampler {
    indices: Vec<usize>,
    pos: usize,
}

impl ShuffleSampler {
    /// Create a shuffled sampler for `len` items, using `seed`.
    pub fn new(len: usize, seed: u64) -> Self {
        let mut indices: Vec<usize> = (0..len).collect();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);

        // === Manual Fisher–Yates shuffle ===
        for i in (1..len).rev() {
            let j = (rng.next_u64() % (i as u64 + 1)) as usize;
            indices.swap(i, j);
        }

        Self { indices, pos: 0 }
    }

    /// The not-yet-yielded part of the permutation.
    pub fn into_indices(self) -> Vec<usize> {
        self.indices[self.pos..].to_vec()
    }
}

impl Iterator for ShuffleSampler {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let i = *self.indices.get(self.pos)?;
        self.pos += 1;
        Some(i)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.indices.len().saturating_sub(self.pos);
        (n, Some(n))
    }
}

impl ExactSizeIterator for ShuffleSampler {}
