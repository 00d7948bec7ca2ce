// src/data_loader/vector.rs
//
// Vector-index dataset: sample `i` is the record whose id is `id_mapping(i)`
// in one namespace. A batch is a single fetch with the whole id list.

use log::debug;
use std::sync::Arc;

use crate::data_loader::dataset::DatasetError;
use crate::data_loader::engine::{align_by_key, Fetch, RemoteDataset};
use crate::data_loader::length::NamespaceCount;
use crate::data_loader::locator::{IdLocator, KeyMapping, VectorId};
use crate::data_loader::transform::Identity;
use crate::store::vector::{FetchOptions, FetchResult, VectorIndex};

pub type VectorDataset<I, M, T = Identity> =
    RemoteDataset<VectorReader<I>, IdLocator<M>, NamespaceCount<I>, T>;

/// Fetch-by-id reads from one namespace.
pub struct VectorReader<I: ?Sized> {
    index: Arc<I>,
    namespace: String,
    options: FetchOptions,
}

impl<I: VectorIndex + ?Sized> VectorReader<I> {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    fn fetch_ids(&self, ids: &[String]) -> Result<Vec<Option<FetchResult>>, DatasetError> {
        let results = self.index.fetch(ids, &self.namespace, &self.options)?;
        debug!("vector fetch of {} ids returned {} slots", ids.len(), results.len());
        let found: Vec<FetchResult> = results.into_iter().flatten().collect();
        Ok(align_by_key(ids, found, |r| &r.id))
    }
}

impl<I: VectorIndex + ?Sized> Fetch<VectorId> for VectorReader<I> {
    type Raw = FetchResult;

    fn fetch(&self, locator: &VectorId) -> Result<Option<FetchResult>, DatasetError> {
        let mut slots = self.fetch_ids(std::slice::from_ref(&locator.0))?;
        Ok(slots.pop().flatten())
    }

    fn fetch_many(&self, locators: &[VectorId]) -> Result<Vec<Option<FetchResult>>, DatasetError> {
        let ids: Vec<String> = locators.iter().map(|l| l.0.clone()).collect();
        self.fetch_ids(&ids)
    }
}

impl<I, M> RemoteDataset<VectorReader<I>, IdLocator<M>, NamespaceCount<I>, Identity>
where
    I: VectorIndex + ?Sized,
    M: KeyMapping,
{
    /// Records of `namespace` addressed by `id_mapping(i)`; pass
    /// [`DEFAULT_NAMESPACE`](crate::constants::DEFAULT_NAMESPACE) for the
    /// index's unnamed namespace. Length is the namespace's record count.
    /// Fetches use [`FetchOptions::default`] until
    /// [`RemoteDataset::with_fetch_options`] is called.
    pub fn vector(index: Arc<I>, namespace: impl Into<String>, id_mapping: M) -> Self {
        let namespace = namespace.into();
        let length = NamespaceCount::new(index.clone(), namespace.clone());
        let reader = VectorReader { index, namespace, options: FetchOptions::default() };
        RemoteDataset::from_parts(reader, IdLocator::new(id_mapping), length)
    }
}

impl<I, L, N, T> RemoteDataset<VectorReader<I>, L, N, T>
where
    I: VectorIndex + ?Sized,
{
    /// Choose which optional fields each fetched record carries.
    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.backend_mut().options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_NAMESPACE;
    use crate::data_loader::dataset::Dataset;
    use crate::data_loader::locator::DecimalIds;
    use crate::data_loader::options::ReadOptions;
    use crate::store::memory::MemoryVectorIndex;

    fn index() -> Arc<MemoryVectorIndex> {
        let index = Arc::new(MemoryVectorIndex::new());
        index.upsert("ns", (0..3).map(|i| {
            let mut v = vec![0.0; 3];
            v[i] = 1.0;
            FetchResult::new(i.to_string()).with_vector(v).with_data(format!("doc {}", i))
        }));
        index
    }

    #[test]
    fn single_fetch_is_one_round_trip() {
        let index = index();
        let ds = RemoteDataset::vector(index.clone(), "ns", DecimalIds)
            .with_read_options(ReadOptions::default().check_bounds(false));
        let r = ds.get(1).unwrap();
        assert_eq!(r.vector, Some(vec![0.0, 1.0, 0.0]));
        assert_eq!(r.data, None);
        assert_eq!(index.round_trips(), 1);
    }

    #[test]
    fn fetch_options_pass_through() {
        let ds = RemoteDataset::vector(index(), "ns", DecimalIds)
            .with_fetch_options(FetchOptions::default().include_vectors(false).include_data(true));
        assert!(ds.backend().options().include_data);
        let r = ds.get(2).unwrap();
        assert_eq!(r.vector, None);
        assert_eq!(r.data.as_deref(), Some("doc 2"));
    }

    #[test]
    fn unordered_backend_is_realigned() {
        let index = index();
        index.set_unordered(true);
        let ds = RemoteDataset::vector(index, "ns", DecimalIds);
        let got = ds.get_many(&[2, 0, 2, 1]).unwrap();
        let ids: Vec<String> = got.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["2", "0", "2", "1"]);
    }

    #[test]
    fn default_namespace_is_separate() {
        let index = index();
        index.upsert(DEFAULT_NAMESPACE, [FetchResult::new("0").with_data("unnamed")]);
        let ds = RemoteDataset::vector(index, DEFAULT_NAMESPACE, DecimalIds)
            .with_fetch_options(FetchOptions::default().include_data(true));
        assert_eq!(ds.len().unwrap(), 1);
        assert_eq!(ds.get(0).unwrap().data.as_deref(), Some("unnamed"));
    }
}
