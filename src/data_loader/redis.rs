// src/data_loader/redis.rs
//
// Redis-backed datasets: lists, sorted sets, one string per key, elements of
// one JSON array, and one JSON document per key. Batched reads go out as a
// single pipeline (or a single JSON.MGET) with one read per requested index.

use anyhow::Result as AnyResult;
use std::sync::Arc;

use crate::data_loader::dataset::DatasetError;
use crate::data_loader::engine::{Fetch, RemoteDataset};
use crate::data_loader::length::{Length, StoreCount};
use crate::data_loader::locator::{
    ArrayElementLocator, DocumentLocator, JsonLocation, KeyLocator, KeyMapping, Position,
    PositionLocator, RedisKey,
};
use crate::data_loader::transform::Identity;
use crate::store::json_path::JsonPath;
use crate::store::redis::{Command, RedisClient, Reply};
use serde_json::Value;

pub type RedisListDataset<C, T = Identity> =
    RemoteDataset<ListReader<C>, PositionLocator, StoreCount<C>, T>;
pub type RedisSortedSetDataset<C, T = Identity> =
    RemoteDataset<SortedSetReader<C>, PositionLocator, StoreCount<C>, T>;
pub type RedisStringDataset<C, M, N, T = Identity> =
    RemoteDataset<StringReader<C>, KeyLocator<M>, N, T>;
pub type RedisJsonArrayDataset<C, T = Identity> =
    RemoteDataset<JsonReader<C>, ArrayElementLocator, StoreCount<C>, T>;
pub type RedisJsonObjectDataset<C, M, N, T = Identity> =
    RemoteDataset<JsonReader<C>, DocumentLocator<M>, N, T>;

fn position(p: &Position) -> Result<i64, DatasetError> {
    i64::try_from(p.0)
        .map_err(|_| DatasetError::InvalidArgument(format!("{} does not fit a Redis index", p)))
}

/// Run one command per locator in a single pipeline and decode each reply.
fn pipelined<C, R>(
    client: &C,
    cmds: Vec<Command>,
    decode: fn(Reply) -> AnyResult<Option<R>>,
) -> Result<Vec<Option<R>>, DatasetError>
where
    C: RedisClient + ?Sized,
{
    let replies = client.pipeline(cmds)?;
    replies
        .into_iter()
        .map(|r| decode(r).map_err(DatasetError::Backend))
        .collect()
}

fn parse_path(path: &str) -> Result<JsonPath, DatasetError> {
    JsonPath::parse(path).map_err(|e| DatasetError::InvalidArgument(e.to_string()))
}

// ── list ────────────────────────────────────────────────────────────────────

/// LINDEX reads from one list.
pub struct ListReader<C: ?Sized> {
    client: Arc<C>,
    key: String,
}

impl<C: RedisClient + ?Sized> ListReader<C> {
    fn command(&self, p: &Position) -> Result<Command, DatasetError> {
        Ok(Command::LIndex { key: self.key.clone(), index: position(p)? })
    }
}

impl<C: RedisClient + ?Sized> Fetch<Position> for ListReader<C> {
    type Raw = String;

    fn fetch(&self, locator: &Position) -> Result<Option<String>, DatasetError> {
        Ok(self.client.execute(self.command(locator)?)?.into_bulk()?)
    }

    fn fetch_many(&self, locators: &[Position]) -> Result<Vec<Option<String>>, DatasetError> {
        let cmds = locators.iter().map(|p| self.command(p)).collect::<Result<Vec<_>, _>>()?;
        pipelined(&*self.client, cmds, Reply::into_bulk)
    }
}

impl<C: RedisClient + ?Sized>
    RemoteDataset<ListReader<C>, PositionLocator, StoreCount<C>, Identity>
{
    /// Each element of the list at `key` is a sample; the index is the list
    /// position. Length is LLEN.
    pub fn redis_list(client: Arc<C>, key: impl Into<String>) -> Self {
        let key = key.into();
        let length = StoreCount::new(client.clone(), Command::LLen { key: key.clone() });
        RemoteDataset::from_parts(ListReader { client, key }, PositionLocator, length)
    }
}

// ── sorted set ──────────────────────────────────────────────────────────────

/// `ZRANGE key i i WITHSCORES` reads from one sorted set.
pub struct SortedSetReader<C: ?Sized> {
    client: Arc<C>,
    key: String,
}

impl<C: RedisClient + ?Sized> SortedSetReader<C> {
    fn command(&self, p: &Position) -> Result<Command, DatasetError> {
        let i = position(p)?;
        Ok(Command::ZRange { key: self.key.clone(), start: i, stop: i, with_scores: true })
    }
}

impl<C: RedisClient + ?Sized> Fetch<Position> for SortedSetReader<C> {
    type Raw = (String, f64);

    fn fetch(&self, locator: &Position) -> Result<Option<(String, f64)>, DatasetError> {
        Ok(self.client.execute(self.command(locator)?)?.into_first_scored()?)
    }

    fn fetch_many(
        &self,
        locators: &[Position],
    ) -> Result<Vec<Option<(String, f64)>>, DatasetError> {
        let cmds = locators.iter().map(|p| self.command(p)).collect::<Result<Vec<_>, _>>()?;
        pipelined(&*self.client, cmds, Reply::into_first_scored)
    }
}

impl<C: RedisClient + ?Sized>
    RemoteDataset<SortedSetReader<C>, PositionLocator, StoreCount<C>, Identity>
{
    /// Each `(member, score)` of the sorted set at `key`, in rank order, is a
    /// sample. Length is ZCARD.
    pub fn redis_sorted_set(client: Arc<C>, key: impl Into<String>) -> Self {
        let key = key.into();
        let length = StoreCount::new(client.clone(), Command::ZCard { key: key.clone() });
        RemoteDataset::from_parts(SortedSetReader { client, key }, PositionLocator, length)
    }
}

// ── strings ─────────────────────────────────────────────────────────────────

/// GET reads, one key per sample.
pub struct StringReader<C: ?Sized> {
    client: Arc<C>,
}

impl<C: RedisClient + ?Sized> Fetch<RedisKey> for StringReader<C> {
    type Raw = String;

    fn fetch(&self, locator: &RedisKey) -> Result<Option<String>, DatasetError> {
        let cmd = Command::Get { key: locator.0.clone() };
        Ok(self.client.execute(cmd)?.into_bulk()?)
    }

    fn fetch_many(&self, locators: &[RedisKey]) -> Result<Vec<Option<String>>, DatasetError> {
        let cmds = locators.iter().map(|k| Command::Get { key: k.0.clone() }).collect();
        pipelined(&*self.client, cmds, Reply::into_bulk)
    }
}

impl<C, M, N> RemoteDataset<StringReader<C>, KeyLocator<M>, N, Identity>
where
    C: RedisClient + ?Sized,
    M: KeyMapping,
    N: Length,
{
    /// Each string stored at `key_mapping(i)` is sample `i`; the caller
    /// supplies the length.
    pub fn redis_string(client: Arc<C>, key_mapping: M, length: N) -> Self {
        RemoteDataset::from_parts(StringReader { client }, KeyLocator::new(key_mapping), length)
    }
}

// ── JSON ────────────────────────────────────────────────────────────────────

/// JSON.GET / JSON.MGET reads. The raw record is the first value the path
/// matches; a missing key or no match is "not found".
pub struct JsonReader<C: ?Sized> {
    client: Arc<C>,
}

impl<C: RedisClient + ?Sized> Fetch<JsonLocation> for JsonReader<C> {
    type Raw = Value;

    fn fetch(&self, locator: &JsonLocation) -> Result<Option<Value>, DatasetError> {
        let cmd = Command::JsonGet { key: locator.key.clone(), path: locator.path.clone() };
        Ok(self.client.execute(cmd)?.into_first_json_match()?)
    }

    fn fetch_many(&self, locators: &[JsonLocation]) -> Result<Vec<Option<Value>>, DatasetError> {
        let Some(first) = locators.first() else {
            return Ok(Vec::new());
        };

        // One path across many documents: a single multi-get.
        if locators.iter().all(|l| l.path == first.path) {
            let cmd = Command::JsonMGet {
                keys: locators.iter().map(|l| l.key.clone()).collect(),
                path: first.path.clone(),
            };
            let items = match self.client.execute(cmd)? {
                Reply::Array(items) => items,
                other => {
                    return Err(DatasetError::from(format!(
                        "protocol error: JSON.MGET returned {:?}",
                        other
                    )))
                }
            };
            return items
                .into_iter()
                .map(|r| r.into_first_json_match().map_err(DatasetError::Backend))
                .collect();
        }

        let cmds = locators
            .iter()
            .map(|l| Command::JsonGet { key: l.key.clone(), path: l.path.clone() })
            .collect();
        pipelined(&*self.client, cmds, Reply::into_first_json_match)
    }
}

impl<C: RedisClient + ?Sized>
    RemoteDataset<JsonReader<C>, ArrayElementLocator, StoreCount<C>, Identity>
{
    /// Each element of the JSON array at `array_path` inside the document at
    /// `key` is a sample. `""` or `"$"` means the document itself is the
    /// array. Length is JSON.ARRLEN.
    ///
    /// Only definite paths are accepted: `$` followed by `.name`, `['name']`
    /// and `[n]` segments, where `.name` is an identifier. Anything else
    /// (wildcards, slices, filters, `$.a-b`) is `InvalidArgument`; write
    /// non-identifier fields as `['a-b']`.
    pub fn redis_json_array(
        client: Arc<C>,
        key: impl Into<String>,
        array_path: &str,
    ) -> Result<Self, DatasetError> {
        let key = key.into();
        let path = parse_path(array_path)?;
        let length = StoreCount::new(
            client.clone(),
            Command::JsonArrLen { key: key.clone(), path: path.clone() },
        );
        Ok(RemoteDataset::from_parts(
            JsonReader { client },
            ArrayElementLocator::new(key, path),
            length,
        ))
    }
}

impl<C, M, N> RemoteDataset<JsonReader<C>, DocumentLocator<M>, N, Identity>
where
    C: RedisClient + ?Sized,
    M: KeyMapping,
    N: Length,
{
    /// Sample `i` is the value at `object_path` in the document stored at
    /// `key_mapping(i)`. With a root path (`""` or `"$"`) the whole document
    /// is the sample. Single and batch reads both use the per-index key.
    ///
    /// `object_path` follows the same definite-path syntax as
    /// [`RemoteDataset::redis_json_array`]; other paths are
    /// `InvalidArgument`.
    pub fn redis_json_object(
        client: Arc<C>,
        key_mapping: M,
        length: N,
        object_path: &str,
    ) -> Result<Self, DatasetError> {
        let path = parse_path(object_path)?;
        Ok(RemoteDataset::from_parts(
            JsonReader { client },
            DocumentLocator::new(key_mapping, path),
            length,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::dataset::Dataset;
    use crate::data_loader::options::ReadOptions;
    use crate::store::memory::MemoryRedis;
    use serde_json::json;

    #[test]
    fn json_array_batch_uses_one_pipeline() {
        let redis = Arc::new(MemoryRedis::new());
        redis.json_set("doc", "$", json!({"array": ["test", "asd", "lorem"]})).unwrap();
        let ds = RemoteDataset::redis_json_array(redis.clone(), "doc", "$.array").unwrap();

        let before = redis.round_trips();
        let got = ds.get_many(&[0, 2, 1]).unwrap();
        assert_eq!(got, vec![json!("test"), json!("lorem"), json!("asd")]);
        // ARRLEN for the bounds check plus one pipeline.
        assert_eq!(redis.round_trips() - before, 2);
    }

    #[test]
    fn json_object_batch_uses_mget() {
        let redis = Arc::new(MemoryRedis::new());
        for (i, s) in ["test", "asd", "lorem"].iter().enumerate() {
            redis.json_set(&format!("obj_{}", i), "$", json!({"str": s})).unwrap();
        }
        let key = |i: usize| format!("obj_{}", i);
        let ds = RemoteDataset::redis_json_object(redis.clone(), key, || 3usize, "$.str")
            .unwrap()
            .with_read_options(ReadOptions::default().check_bounds(false));

        let before = redis.round_trips();
        assert_eq!(ds.get_many(&[2, 0]).unwrap(), vec![json!("lorem"), json!("test")]);
        assert_eq!(redis.round_trips() - before, 1);
    }

    #[test]
    fn invalid_paths_are_rejected_up_front() {
        let redis = Arc::new(MemoryRedis::new());
        let err = RemoteDataset::redis_json_array(redis, "doc", "array").err().unwrap();
        assert!(matches!(err, DatasetError::InvalidArgument(_)));
    }

    #[test]
    fn wrongtype_is_a_backend_error() {
        let redis = Arc::new(MemoryRedis::new());
        redis.set("not_a_list", "x");
        let ds = RemoteDataset::redis_list(redis, "not_a_list");
        let err = ds.len().unwrap_err();
        assert!(matches!(err, DatasetError::LengthUnavailable { .. }));
        let ds = ds.with_read_options(ReadOptions::default().check_bounds(false));
        assert!(matches!(ds.get_many(&[0]).unwrap_err(), DatasetError::Backend(_)));
    }
}
