// src/data_loader/compose.rs
//
// Dataset composition: concatenation, index subsets and seeded random splits.
// Batched reads stay batched: each underlying dataset sees at most one
// `get_many` per call.

use std::sync::Arc;

use crate::data_loader::dataset::{Dataset, DatasetError};
use crate::data_loader::sampler::ShuffleSampler;

/// Several datasets with the same item type, end to end.
pub struct ConcatDataset<I> {
    parts: Vec<Box<dyn Dataset<Item = I>>>,
}

impl<I> Default for ConcatDataset<I> {
    fn default() -> Self {
        Self { parts: Vec::new() }
    }
}

impl<I> ConcatDataset<I> {
    pub fn new(parts: Vec<Box<dyn Dataset<Item = I>>>) -> Self {
        Self { parts }
    }

    /// Builder-style helper: append a dataset.
    pub fn with(mut self, part: impl Dataset<Item = I> + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    /// Current length of every part, queried once.
    fn part_lens(&self) -> Result<Vec<usize>, DatasetError> {
        self.parts.iter().map(|p| p.len()).collect()
    }
}

/// `(part, local index)` for a global index, given the part lengths.
fn route(lens: &[usize], index: usize) -> Option<(usize, usize)> {
    let mut offset = 0;
    for (part, &len) in lens.iter().enumerate() {
        if index < offset + len {
            return Some((part, index - offset));
        }
        offset += len;
    }
    None
}

impl<I> Dataset for ConcatDataset<I> {
    type Item = I;

    fn len(&self) -> Result<usize, DatasetError> {
        Ok(self.part_lens()?.iter().sum())
    }

    fn get(&self, index: usize) -> Result<I, DatasetError> {
        let lens = self.part_lens()?;
        let (part, local) = route(&lens, index)
            .ok_or(DatasetError::IndexOutOfRange { index, len: lens.iter().sum() })?;
        self.parts[part].get(local)
    }

    fn get_many(&self, indices: &[usize]) -> Result<Vec<I>, DatasetError> {
        let lens = self.part_lens()?;

        // Per part: the local indices and the output slot each one fills.
        let mut plan: Vec<(Vec<usize>, Vec<usize>)> =
            vec![(Vec::new(), Vec::new()); self.parts.len()];
        for (slot, &index) in indices.iter().enumerate() {
            let (part, local) = route(&lens, index)
                .ok_or(DatasetError::IndexOutOfRange { index, len: lens.iter().sum() })?;
            plan[part].0.push(local);
            plan[part].1.push(slot);
        }

        let mut out: Vec<Option<I>> = (0..indices.len()).map(|_| None).collect();
        for (part, (locals, slots)) in plan.into_iter().enumerate() {
            if locals.is_empty() {
                continue;
            }
            let items = self.parts[part].get_many(&locals)?;
            if items.len() != slots.len() {
                return Err(DatasetError::from(format!(
                    "part {} returned {} items for {} indices",
                    part,
                    items.len(),
                    slots.len()
                )));
            }
            for (slot, item) in slots.into_iter().zip(items) {
                out[slot] = Some(item);
            }
        }
        out.into_iter()
            .map(|item| item.ok_or_else(|| DatasetError::from("concat lost an item")))
            .collect()
    }
}

/// A fixed selection of another dataset's indices.
#[derive(Debug, Clone)]
pub struct Subset<D> {
    inner: D,
    indices: Vec<usize>,
}

impl<D: Dataset> Subset<D> {
    pub fn new(inner: D, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    fn map_index(&self, index: usize) -> Result<usize, DatasetError> {
        self.indices
            .get(index)
            .copied()
            .ok_or(DatasetError::IndexOutOfRange { index, len: self.indices.len() })
    }
}

impl<D: Dataset> Dataset for Subset<D> {
    type Item = D::Item;

    fn len(&self) -> Result<usize, DatasetError> {
        Ok(self.indices.len())
    }

    fn get(&self, index: usize) -> Result<D::Item, DatasetError> {
        self.inner.get(self.map_index(index)?)
    }

    fn get_many(&self, indices: &[usize]) -> Result<Vec<D::Item>, DatasetError> {
        let mapped = indices
            .iter()
            .map(|&i| self.map_index(i))
            .collect::<Result<Vec<_>, _>>()?;
        self.inner.get_many(&mapped)
    }
}

/// Turn fractions into lengths that sum to `total`: scale each share by the
/// fractions' sum, floor it, then hand out the remainder one at a time,
/// round-robin from the first split.
pub fn split_lengths(total: usize, fractions: &[f64]) -> Result<Vec<usize>, DatasetError> {
    let sum: f64 = fractions.iter().sum();
    let out_of_unit = fractions.iter().any(|f| !(0.0..=1.0).contains(f));
    if fractions.is_empty() || out_of_unit || (sum - 1.0).abs() > 1e-6 {
        return Err(DatasetError::InvalidArgument(format!(
            "split fractions must lie in [0, 1] and sum to 1, got {:?}",
            fractions
        )));
    }
    let mut lens: Vec<usize> = fractions
        .iter()
        .map(|f| (total as f64 * (f / sum)).floor() as usize)
        .collect();

    // Rounding may still overshoot by a few; take the excess from the back.
    let mut excess = lens.iter().sum::<usize>().saturating_sub(total);
    for len in lens.iter_mut().rev() {
        let cut = excess.min(*len);
        *len -= cut;
        excess -= cut;
    }

    let remainder = total.saturating_sub(lens.iter().sum::<usize>());
    let n = lens.len();
    for i in 0..remainder {
        lens[i % n] += 1;
    }
    Ok(lens)
}

/// Split `dataset` into disjoint random subsets of the given lengths. The
/// permutation is fixed by `seed`.
pub fn random_split<D: Dataset>(
    dataset: Arc<D>,
    lengths: &[usize],
    seed: u64,
) -> Result<Vec<Subset<Arc<D>>>, DatasetError> {
    let total = dataset.len()?;
    let requested: usize = lengths.iter().sum();
    if requested != total {
        return Err(DatasetError::InvalidArgument(format!(
            "split lengths sum to {} but the dataset has {} samples",
            requested, total
        )));
    }

    let mut perm = ShuffleSampler::new(total, seed);
    Ok(lengths
        .iter()
        .map(|&n| Subset::new(dataset.clone(), perm.by_ref().take(n).collect()))
        .collect())
}
