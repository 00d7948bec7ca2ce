// src/store/mod.rs

//! Contracts for the remote stores the datasets read from.
//!
//! The crate does not talk to the network itself. Callers hand in a client
//! implementing [`RedisClient`] or [`VectorIndex`]; [`memory`] provides
//! in-process implementations for tests and demos.

pub mod json_path;
pub mod memory;
pub mod redis;
pub mod vector;

pub use json_path::JsonPath;
pub use memory::{MemoryRedis, MemoryVectorIndex};
pub use redis::{Command, RedisClient, Reply};
pub use vector::{FetchOptions, FetchResult, IndexInfo, NamespaceInfo, VectorIndex};
