// src/data_loader/mod.rs

//! Public API surface for the dataset layer.

/// expose the `dataset` module (file dataset.rs)
pub mod dataset;

pub mod compose;
pub mod engine;
pub mod length;
pub mod locator;
pub mod options;
pub mod redis;
pub mod sampler;
pub mod transform;
pub mod vector;

// Re‐export the key types at this level:
pub use compose::{random_split, split_lengths, ConcatDataset, Subset};
pub use dataset::{Dataset, DatasetError};
pub use engine::{align_by_key, Fetch, RemoteDataset};
pub use length::{Length, NamespaceCount, StoreCount};
pub use locator::{
    ArrayElementLocator, DecimalIds, DocumentLocator, IdLocator, JsonLocation, KeyLocator,
    KeyMapping, Locate, Position, PositionLocator, RedisKey, VectorId,
};
pub use options::{FetchOptions, ReadOptions};
pub use redis::{
    JsonReader, ListReader, RedisJsonArrayDataset, RedisJsonObjectDataset, RedisListDataset,
    RedisSortedSetDataset, RedisStringDataset, SortedSetReader, StringReader,
};
pub use sampler::ShuffleSampler;
pub use transform::{Fallible, Identity, MapDataset, Transform};
pub use vector::{VectorDataset, VectorReader};
