//! Core dataset abstractions for upstash-dataset.
//!
//! A [`Dataset`] is a fixed-size, randomly indexable, order-preserving
//! sequence of samples. Remote datasets answer every call with blocking
//! store reads; nothing is cached between calls.

use std::sync::Arc;
use thiserror::Error;
use anyhow::Error as AnyError;

/// Error type for every dataset operation.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The store has no record at the locator an index maps to.
    #[error("index out of range: {index} (no record at {locator})")]
    Missing { index: usize, locator: String },

    #[error("dataset length unavailable: {reason}")]
    LengthUnavailable {
        reason: String,
        #[source]
        source: Option<AnyError>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Raised by a caller-supplied transform.
    #[error(transparent)]
    Transform(AnyError),

    /// Raised by the store client, or a reply that does not decode.
    #[error(transparent)]
    Backend(#[from] AnyError),
}

impl DatasetError {
    /// True for both flavours of range error. This is the error a consumer
    /// may treat as "end of data".
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, DatasetError::IndexOutOfRange { .. } | DatasetError::Missing { .. })
    }

    pub(crate) fn length_unavailable(reason: impl Into<String>, source: Option<AnyError>) -> Self {
        DatasetError::LengthUnavailable { reason: reason.into(), source }
    }
}

// Mapping from string to error
impl From<String> for DatasetError {
    fn from(s: String) -> Self {
        DatasetError::Backend(AnyError::msg(s))
    }
}

impl From<&str> for DatasetError {
    fn from(s: &str) -> Self {
        DatasetError::Backend(AnyError::msg(s.to_string()))
    }
}

/// A logical collection of **samples** addressed by zero-based index.
///
/// * `len` is evaluated on every call so it tracks the live store.
/// * `get_many(&[i0, .., ik])[j]` is the sample `get(ij)` would return;
///   duplicate indices yield one sample per occurrence.
/// * `get_many` either returns every sample or fails; there are no partial
///   results.
pub trait Dataset: Send + Sync {
    /// Concrete Rust type produced for each sample.
    type Item;

    /// Current number of samples.
    fn len(&self) -> Result<usize, DatasetError>;

    /// Retrieve a sample by zero-based index.
    fn get(&self, index: usize) -> Result<Self::Item, DatasetError>;

    /// Retrieve several samples, aligned with `indices`.
    ///
    /// The default fetches one at a time; remote datasets override it to
    /// use a single store exchange.
    fn get_many(&self, indices: &[usize]) -> Result<Vec<Self::Item>, DatasetError> {
        indices.iter().map(|&i| self.get(i)).collect()
    }

    /// Convenience helper.
    fn is_empty(&self) -> Result<bool, DatasetError> {
        self.len().map(|n| n == 0)
    }
}

impl<D: Dataset + ?Sized> Dataset for Arc<D> {
    type Item = D::Item;

    fn len(&self) -> Result<usize, DatasetError> {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<Self::Item, DatasetError> {
        (**self).get(index)
    }

    fn get_many(&self, indices: &[usize]) -> Result<Vec<Self::Item>, DatasetError> {
        (**self).get_many(indices)
    }
}

impl<D: Dataset + ?Sized> Dataset for Box<D> {
    type Item = D::Item;

    fn len(&self) -> Result<usize, DatasetError> {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<Self::Item, DatasetError> {
        (**self).get(index)
    }

    fn get_many(&self, indices: &[usize]) -> Result<Vec<Self::Item>, DatasetError> {
        (**self).get_many(indices)
    }
}
