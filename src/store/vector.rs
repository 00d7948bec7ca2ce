// src/store/vector.rs
//
// Vector-index client contract: fetch-by-id with inclusion flags and the
// index info call that reports per-namespace record counts.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One record returned by a fetch. Optional fields are present only when
/// the corresponding include flag was set and the record carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl FetchResult {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), vector: None, metadata: None, data: None }
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceInfo {
    pub vector_count: usize,
    #[serde(default)]
    pub pending_vector_count: usize,
}

/// Index-wide statistics, as reported by the info endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub vector_count: usize,
    #[serde(default)]
    pub pending_vector_count: usize,
    #[serde(default)]
    pub index_size: u64,
    #[serde(default)]
    pub dimension: usize,
    #[serde(default)]
    pub similarity_function: String,
    #[serde(default)]
    pub namespaces: HashMap<String, NamespaceInfo>,
}

/// Which optional fields a fetch should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub include_vectors: bool,
    pub include_metadata: bool,
    pub include_data: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { include_vectors: true, include_metadata: true, include_data: false }
    }
}

impl FetchOptions {
    pub fn include_vectors(mut self, yes: bool) -> Self {
        self.include_vectors = yes;
        self
    }

    pub fn include_metadata(mut self, yes: bool) -> Self {
        self.include_metadata = yes;
        self
    }

    pub fn include_data(mut self, yes: bool) -> Self {
        self.include_data = yes;
        self
    }
}

/// Blocking vector-index client as seen by the dataset adapters.
pub trait VectorIndex: Send + Sync {
    /// Fetch records by id in one round trip. The reply carries `None` for
    /// ids that do not exist. Implementations may return records in any
    /// order; callers re-align by id.
    fn fetch(
        &self,
        ids: &[String],
        namespace: &str,
        opts: &FetchOptions,
    ) -> Result<Vec<Option<FetchResult>>>;

    /// Index statistics, including per-namespace record counts.
    fn info(&self) -> Result<IndexInfo>;
}

impl<I: VectorIndex + ?Sized> VectorIndex for std::sync::Arc<I> {
    fn fetch(
        &self,
        ids: &[String],
        namespace: &str,
        opts: &FetchOptions,
    ) -> Result<Vec<Option<FetchResult>>> {
        (**self).fetch(ids, namespace, opts)
    }

    fn info(&self) -> Result<IndexInfo> {
        (**self).info()
    }
}
