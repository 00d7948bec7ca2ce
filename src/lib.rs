// src/lib.rs
//
// Crate root: public re-exports.

//! Random-access training datasets over Upstash Redis and Upstash Vector.
//!
//! Every dataset is a [`RemoteDataset`]: a store reader, an index → locator
//! strategy, a length strategy and a transform. Six constructors wire the
//! supported layouts:
//!
//! | constructor | sample `i` | length |
//! |---|---|---|
//! | [`RemoteDataset::redis_list`] | `LINDEX key i` | `LLEN` |
//! | [`RemoteDataset::redis_sorted_set`] | `ZRANGE key i i WITHSCORES` | `ZCARD` |
//! | [`RemoteDataset::redis_string`] | `GET key_mapping(i)` | caller |
//! | [`RemoteDataset::redis_json_array`] | `JSON.GET key path[i]` | `JSON.ARRLEN` |
//! | [`RemoteDataset::redis_json_object`] | `JSON.GET key_mapping(i) path` | caller |
//! | [`RemoteDataset::vector`] | fetch `id_mapping(i)` | namespace count |
//!
//! ```
//! use std::sync::Arc;
//! use upstash_dataset::{Dataset, MemoryRedis, RemoteDataset};
//!
//! let redis = Arc::new(MemoryRedis::new());
//! redis.rpush("comments", ["great", "awful"]).unwrap();
//!
//! let ds = RemoteDataset::redis_list(redis, "comments")
//!     .with_transform(|text: String| text.len());
//! assert_eq!(ds.len().unwrap(), 2);
//! assert_eq!(ds.get_many(&[1, 0]).unwrap(), vec![5, 5]);
//! ```

pub mod constants;
pub mod data_loader;
pub mod store;

pub use crate::data_loader::{
    random_split, split_lengths, ConcatDataset, Dataset, DatasetError, DecimalIds, Fallible,
    FetchOptions, Identity, MapDataset, ReadOptions, RemoteDataset, Subset, Transform,
};
pub use crate::store::{
    FetchResult, IndexInfo, JsonPath, MemoryRedis, MemoryVectorIndex, RedisClient, VectorIndex,
};
