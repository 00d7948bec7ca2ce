// src/data_loader/length.rs
//
// Dataset-size strategies. Evaluated on every call; never memoized.

use std::sync::Arc;

use crate::data_loader::dataset::DatasetError;
use crate::store::redis::{Command, RedisClient};
use crate::store::vector::VectorIndex;

/// Produces the current number of samples.
pub trait Length: Send + Sync {
    fn length(&self) -> Result<usize, DatasetError>;
}

/// A caller-supplied count.
impl<F> Length for F
where
    F: Fn() -> usize + Send + Sync,
{
    fn length(&self) -> Result<usize, DatasetError> {
        Ok(self())
    }
}

/// Count reported by a Redis command (LLEN, ZCARD, JSON.ARRLEN).
pub struct StoreCount<C: ?Sized> {
    client: Arc<C>,
    command: Command,
}

impl<C: RedisClient + ?Sized> StoreCount<C> {
    pub fn new(client: Arc<C>, command: Command) -> Self {
        Self { client, command }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

impl<C: RedisClient + ?Sized> Length for StoreCount<C> {
    fn length(&self) -> Result<usize, DatasetError> {
        let reply = self.client.execute(self.command.clone()).map_err(|e| {
            DatasetError::length_unavailable(format!("{} failed", self.command.name()), Some(e))
        })?;
        reply.into_count().map_err(|e| {
            let reason = format!("malformed reply to {}", self.command);
            DatasetError::length_unavailable(reason, Some(e))
        })
    }
}

/// Record count of one vector index namespace.
pub struct NamespaceCount<I: ?Sized> {
    index: Arc<I>,
    namespace: String,
}

impl<I: VectorIndex + ?Sized> NamespaceCount<I> {
    pub fn new(index: Arc<I>, namespace: impl Into<String>) -> Self {
        Self { index, namespace: namespace.into() }
    }
}

impl<I: VectorIndex + ?Sized> Length for NamespaceCount<I> {
    fn length(&self) -> Result<usize, DatasetError> {
        let info = self
            .index
            .info()
            .map_err(|e| DatasetError::length_unavailable("index info failed", Some(e)))?;
        info.namespaces
            .get(&self.namespace)
            .map(|ns| ns.vector_count)
            .ok_or_else(|| {
                let reason = format!("unknown namespace {:?}", self.namespace);
                DatasetError::length_unavailable(reason, None)
            })
    }
}
