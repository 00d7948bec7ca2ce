// src/data_loader/engine.rs
//
// The one generic remote dataset. Every concrete adapter is a `RemoteDataset`
// wired with a store reader (`Fetch`), a locator strategy, a length strategy
// and a transform.

use log::{debug, trace, warn};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::data_loader::dataset::{Dataset, DatasetError};
use crate::data_loader::length::Length;
use crate::data_loader::locator::Locate;
use crate::data_loader::options::ReadOptions;
use crate::data_loader::transform::{Identity, Transform};

/// Reads raw records for locators of type `L`.
///
/// `None` is the per-item "not found" signal.
pub trait Fetch<L>: Send + Sync {
    type Raw;

    /// One store read.
    fn fetch(&self, locator: &L) -> Result<Option<Self::Raw>, DatasetError>;

    /// All reads in as few store exchanges as the backend allows, aligned
    /// with `locators` (duplicates included).
    fn fetch_many(&self, locators: &[L]) -> Result<Vec<Option<Self::Raw>>, DatasetError>;
}

/// Re-map associative or reordered results into request order.
///
/// Each requested key gets a clone of the matching result, so duplicate
/// requests are served even when the backend answered each key once.
/// Results for keys that were never requested are dropped.
pub fn align_by_key<K, R, F>(requested: &[K], results: Vec<R>, key_of: F) -> Vec<Option<R>>
where
    K: Eq + Hash,
    R: Clone,
    F: Fn(&R) -> &K,
{
    let mut by_key: HashMap<&K, R> = HashMap::with_capacity(results.len());
    let mut unrequested = 0usize;
    let wanted: HashSet<&K> = requested.iter().collect();
    for r in &results {
        let k = key_of(r);
        if let Some(k) = wanted.get(k) {
            by_key.entry(*k).or_insert_with(|| r.clone());
        } else {
            unrequested += 1;
        }
    }
    if unrequested > 0 {
        warn!("backend returned {} records that were not requested", unrequested);
    }
    requested.iter().map(|k| by_key.get(k).cloned()).collect()
}

/// A randomly indexable dataset over a remote store.
pub struct RemoteDataset<B, L, N, T = Identity> {
    backend: B,
    locator: L,
    length: N,
    transform: T,
    opts: ReadOptions,
}

impl<B, L, N> RemoteDataset<B, L, N, Identity> {
    /// Wire a dataset from its parts. Samples are the raw records until
    /// [`RemoteDataset::with_transform`] is called.
    pub fn from_parts(backend: B, locator: L, length: N) -> Self {
        Self { backend, locator, length, transform: Identity, opts: ReadOptions::default() }
    }
}

impl<B, L, N, T> RemoteDataset<B, L, N, T> {
    /// Replace the transform applied to every fetched record.
    pub fn with_transform<T2>(self, transform: T2) -> RemoteDataset<B, L, N, T2> {
        RemoteDataset {
            backend: self.backend,
            locator: self.locator,
            length: self.length,
            transform,
            opts: self.opts,
        }
    }

    pub fn with_read_options(mut self, opts: ReadOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn read_options(&self) -> &ReadOptions {
        &self.opts
    }
}

impl<B, L, N, T> RemoteDataset<B, L, N, T>
where
    L: Locate,
    B: Fetch<L::Locator>,
    N: Length,
    T: Transform<B::Raw>,
{
    /// One length query covers the whole request.
    fn check_bounds(&self, indices: &[usize]) -> Result<(), DatasetError> {
        if !self.opts.check_bounds {
            return Ok(());
        }
        let len = self.length.length()?;
        match indices.iter().find(|&&i| i >= len) {
            Some(&index) => Err(DatasetError::IndexOutOfRange { index, len }),
            None => Ok(()),
        }
    }

    fn finish(&self, raw: B::Raw) -> Result<T::Output, DatasetError> {
        self.transform.apply(raw).map_err(DatasetError::Transform)
    }
}

impl<B, L, N, T> Dataset for RemoteDataset<B, L, N, T>
where
    L: Locate,
    B: Fetch<L::Locator>,
    N: Length,
    T: Transform<B::Raw>,
{
    type Item = T::Output;

    fn len(&self) -> Result<usize, DatasetError> {
        self.length.length()
    }

    fn get(&self, index: usize) -> Result<Self::Item, DatasetError> {
        self.check_bounds(&[index])?;
        let locator = self.locator.locate(index);
        trace!("reading {} for index {}", locator, index);
        let raw = self
            .backend
            .fetch(&locator)?
            .ok_or_else(|| DatasetError::Missing { index, locator: locator.to_string() })?;
        self.finish(raw)
    }

    fn get_many(&self, indices: &[usize]) -> Result<Vec<Self::Item>, DatasetError> {
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        self.check_bounds(indices)?;

        let locators: Vec<L::Locator> = indices.iter().map(|&i| self.locator.locate(i)).collect();
        debug!("batched read of {} records", locators.len());
        let raws = self.backend.fetch_many(&locators)?;
        if raws.len() != locators.len() {
            return Err(DatasetError::from(format!(
                "backend returned {} records for {} locators",
                raws.len(),
                locators.len()
            )));
        }

        // All-or-nothing: check every slot before transforming any.
        let raws = raws
            .into_iter()
            .zip(indices.iter().zip(&locators))
            .map(|(raw, (&index, locator))| {
                raw.ok_or_else(|| DatasetError::Missing { index, locator: locator.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(|raw| self.finish(raw)).collect()
    }
}
