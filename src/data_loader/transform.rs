//! Sample transforms and the `MapDataset` combinator.
//!
//! A transform turns one raw record into one training-ready sample. The same
//! transform is applied to every record on both the single and batch paths.

use anyhow::Error as AnyError;

use crate::data_loader::dataset::{Dataset, DatasetError};

/// Post-fetch mapping from a raw record to a sample.
pub trait Transform<R>: Send + Sync {
    type Output;

    fn apply(&self, raw: R) -> Result<Self::Output, AnyError>;
}

/// Returns the raw record unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<R> Transform<R> for Identity {
    type Output = R;

    fn apply(&self, raw: R) -> Result<R, AnyError> {
        Ok(raw)
    }
}

/// Infallible closures.
impl<R, O, F> Transform<R> for F
where
    F: Fn(R) -> O + Send + Sync,
{
    type Output = O;

    fn apply(&self, raw: R) -> Result<O, AnyError> {
        Ok(self(raw))
    }
}

/// Wraps a closure that may fail. Its error reaches the caller unchanged as
/// [`DatasetError::Transform`].
#[derive(Debug, Clone, Copy)]
pub struct Fallible<F>(pub F);

impl<R, O, E, F> Transform<R> for Fallible<F>
where
    F: Fn(R) -> Result<O, E> + Send + Sync,
    E: Into<AnyError>,
{
    type Output = O;

    fn apply(&self, raw: R) -> Result<O, AnyError> {
        (self.0)(raw).map_err(Into::into)
    }
}

/// Map – applies a transform to each item of an inner dataset.
#[derive(Debug, Clone)]
pub struct MapDataset<D, T> {
    inner: D,
    transform: T,
}

impl<D, T> MapDataset<D, T>
where
    D: Dataset,
    T: Transform<D::Item>,
{
    pub fn new(inner: D, transform: T) -> Self {
        Self { inner, transform }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D, T> Dataset for MapDataset<D, T>
where
    D: Dataset,
    T: Transform<D::Item>,
{
    type Item = T::Output;

    fn len(&self) -> Result<usize, DatasetError> {
        self.inner.len()
    }

    fn get(&self, index: usize) -> Result<Self::Item, DatasetError> {
        let v = self.inner.get(index)?;
        self.transform.apply(v).map_err(DatasetError::Transform)
    }

    fn get_many(&self, indices: &[usize]) -> Result<Vec<Self::Item>, DatasetError> {
        self.inner
            .get_many(indices)?
            .into_iter()
            .map(|v| self.transform.apply(v).map_err(DatasetError::Transform))
            .collect()
    }
}
