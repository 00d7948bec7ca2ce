// src/store/memory.rs
//
// In-memory implementations of the store contracts. They follow the reply
// shapes of the hosted services closely enough to exercise every adapter
// without a network, and count round trips so batching can be verified.

use anyhow::{anyhow, bail, Result};
use log::trace;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::constants::WRONGTYPE_ERROR;
use crate::store::json_path::JsonPath;
use crate::store::redis::{Command, RedisClient, Reply};
use crate::store::vector::{FetchOptions, FetchResult, IndexInfo, NamespaceInfo, VectorIndex};

#[derive(Debug, Clone)]
enum Entry {
    Str(String),
    List(VecDeque<String>),
    /// Kept sorted by (score, member).
    ZSet(Vec<(String, f64)>),
    Json(Value),
}

/// Shared connectivity switch and round-trip counter.
#[derive(Debug, Default)]
struct Wire {
    round_trips: AtomicUsize,
    offline: AtomicBool,
}

impl Wire {
    fn exchange(&self, what: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            bail!("connection refused while sending {}", what);
        }
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

/// A single-node, in-process Redis with the string, list, sorted-set and
/// JSON commands the datasets need.
#[derive(Debug, Default)]
pub struct MemoryRedis {
    data: RwLock<HashMap<String, Entry>>,
    wire: Wire,
}

impl MemoryRedis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of client exchanges (single commands or whole pipelines) served.
    pub fn round_trips(&self) -> usize {
        self.wire.round_trips.load(Ordering::SeqCst)
    }

    /// Simulate an unreachable server.
    pub fn set_offline(&self, offline: bool) {
        self.wire.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.write().insert(key.to_string(), Entry::Str(value.into()));
    }

    /// Append to the tail. Returns the new length.
    pub fn rpush<I, S>(&self, key: &str, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut data = self.write();
        let list = list_entry(&mut data, key)?;
        list.extend(values.into_iter().map(Into::into));
        Ok(list.len())
    }

    /// Prepend each value in turn, so the last argument ends up at the head.
    pub fn lpush<I, S>(&self, key: &str, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut data = self.write();
        let list = list_entry(&mut data, key)?;
        for v in values {
            list.push_front(v.into());
        }
        Ok(list.len())
    }

    /// Add or update members. Returns the number of new members.
    pub fn zadd<I, S>(&self, key: &str, members: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut data = self.write();
        let entry = data
            .entry(key.to_string())
            .or_insert_with(|| Entry::ZSet(Vec::new()));
        let Entry::ZSet(set) = entry else {
            bail!(WRONGTYPE_ERROR);
        };
        let mut added = 0;
        for (member, score) in members {
            let member = member.into();
            match set.iter_mut().find(|(m, _)| *m == member) {
                Some(slot) => slot.1 = score,
                None => {
                    set.push((member, score));
                    added += 1;
                }
            }
        }
        set.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(added)
    }

    /// JSON.SET. The root path replaces (or creates) the document; any other
    /// path must address an existing value.
    pub fn json_set(&self, key: &str, path: &str, value: Value) -> Result<()> {
        let path = JsonPath::parse(path)?;
        let mut data = self.write();
        if path.is_root() {
            data.insert(key.to_string(), Entry::Json(value));
            return Ok(());
        }
        match data.get_mut(key) {
            Some(Entry::Json(doc)) => {
                let slot = path
                    .select_mut(doc)
                    .ok_or_else(|| anyhow!("path {} does not exist in {}", path, key))?;
                *slot = value;
                Ok(())
            }
            Some(_) => bail!(WRONGTYPE_ERROR),
            None => bail!("new objects must be created at the root"),
        }
    }

    /// Remove keys. Returns how many existed.
    pub fn del(&self, keys: &[&str]) -> usize {
        let mut data = self.write();
        keys.iter().filter(|k| data.remove(**k).is_some()).count()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn eval(data: &HashMap<String, Entry>, cmd: &Command) -> Reply {
        trace!("memory redis: {}", cmd);
        match cmd {
            Command::LLen { key } => match data.get(key) {
                None => Reply::Int(0),
                Some(Entry::List(l)) => Reply::Int(l.len() as i64),
                Some(_) => wrongtype(),
            },
            Command::LIndex { key, index } => match data.get(key) {
                None => Reply::Nil,
                Some(Entry::List(l)) => match normalize(*index, l.len()) {
                    Some(i) if i < l.len() => Reply::Bulk(l[i].clone()),
                    _ => Reply::Nil,
                },
                Some(_) => wrongtype(),
            },
            Command::ZCard { key } => match data.get(key) {
                None => Reply::Int(0),
                Some(Entry::ZSet(s)) => Reply::Int(s.len() as i64),
                Some(_) => wrongtype(),
            },
            Command::ZRange { key, start, stop, with_scores } => match data.get(key) {
                None => Reply::Array(Vec::new()),
                Some(Entry::ZSet(s)) => {
                    let len = s.len() as i64;
                    let start = if *start < 0 { (len + start).max(0) } else { *start };
                    let stop = if *stop < 0 { len + stop } else { (*stop).min(len - 1) };
                    let mut out = Vec::new();
                    if start <= stop && start < len {
                        for (member, score) in &s[start as usize..=stop as usize] {
                            out.push(Reply::Bulk(member.clone()));
                            if *with_scores {
                                out.push(Reply::Bulk(score.to_string()));
                            }
                        }
                    }
                    Reply::Array(out)
                }
                Some(_) => wrongtype(),
            },
            Command::Get { key } => match data.get(key) {
                None => Reply::Nil,
                Some(Entry::Str(s)) => Reply::Bulk(s.clone()),
                Some(_) => wrongtype(),
            },
            Command::JsonArrLen { key, path } => match data.get(key) {
                None => Reply::Nil,
                Some(Entry::Json(doc)) => match path.select(doc) {
                    Some(Value::Array(a)) => Reply::Array(vec![Reply::Int(a.len() as i64)]),
                    Some(_) => Reply::Array(vec![Reply::Nil]),
                    None => Reply::Array(Vec::new()),
                },
                Some(_) => wrongtype(),
            },
            Command::JsonGet { key, path } => match data.get(key) {
                None => Reply::Nil,
                Some(Entry::Json(doc)) => json_matches(path, doc),
                Some(_) => wrongtype(),
            },
            Command::JsonMGet { keys, path } => Reply::Array(
                keys.iter()
                    .map(|key| match data.get(key) {
                        Some(Entry::Json(doc)) => json_matches(path, doc),
                        _ => Reply::Nil,
                    })
                    .collect(),
            ),
        }
    }
}

impl RedisClient for MemoryRedis {
    fn execute(&self, cmd: Command) -> Result<Reply> {
        self.wire.exchange(cmd.name())?;
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Self::eval(&data, &cmd).check()
    }

    fn pipeline(&self, cmds: Vec<Command>) -> Result<Vec<Reply>> {
        self.wire.exchange("pipeline")?;
        trace!("memory redis: pipeline of {} commands", cmds.len());
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(cmds.iter().map(|cmd| Self::eval(&data, cmd)).collect())
    }
}

fn list_entry<'a>(
    data: &'a mut HashMap<String, Entry>,
    key: &str,
) -> Result<&'a mut VecDeque<String>> {
    match data.entry(key.to_string()).or_insert_with(|| Entry::List(VecDeque::new())) {
        Entry::List(l) => Ok(l),
        _ => bail!(WRONGTYPE_ERROR),
    }
}

fn normalize(index: i64, len: usize) -> Option<usize> {
    if index >= 0 {
        Some(index as usize)
    } else {
        let back = index.unsigned_abs() as usize;
        len.checked_sub(back)
    }
}

fn json_matches(path: &JsonPath, doc: &Value) -> Reply {
    let matches: Vec<Value> = path.select(doc).cloned().into_iter().collect();
    Reply::Bulk(Value::Array(matches).to_string())
}

fn wrongtype() -> Reply {
    Reply::Error(WRONGTYPE_ERROR.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Vector index
// ────────────────────────────────────────────────────────────────────────────

/// An in-process vector index with namespaces.
#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
    namespaces: RwLock<HashMap<String, BTreeMap<String, FetchResult>>>,
    wire: Wire,
    unordered: AtomicBool,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round_trips(&self) -> usize {
        self.wire.round_trips.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.wire.offline.store(offline, Ordering::SeqCst);
    }

    /// When set, `fetch` answers like an associative API: only found records,
    /// each id at most once, sorted by id rather than request order.
    pub fn set_unordered(&self, unordered: bool) {
        self.unordered.store(unordered, Ordering::SeqCst);
    }

    pub fn upsert(&self, namespace: &str, records: impl IntoIterator<Item = FetchResult>) {
        let mut ns = self.namespaces.write().unwrap_or_else(PoisonError::into_inner);
        let bucket = ns.entry(namespace.to_string()).or_default();
        for r in records {
            bucket.insert(r.id.clone(), r);
        }
    }

    /// Returns whether the namespace existed.
    pub fn delete_namespace(&self, namespace: &str) -> bool {
        let mut ns = self.namespaces.write().unwrap_or_else(PoisonError::into_inner);
        ns.remove(namespace).is_some()
    }

    fn shaped(record: &FetchResult, opts: &FetchOptions) -> FetchResult {
        FetchResult {
            id: record.id.clone(),
            vector: record.vector.clone().filter(|_| opts.include_vectors),
            metadata: record.metadata.clone().filter(|_| opts.include_metadata),
            data: record.data.clone().filter(|_| opts.include_data),
        }
    }
}

impl VectorIndex for MemoryVectorIndex {
    fn fetch(
        &self,
        ids: &[String],
        namespace: &str,
        opts: &FetchOptions,
    ) -> Result<Vec<Option<FetchResult>>> {
        self.wire.exchange("fetch")?;
        trace!("memory vector: fetch {} ids from namespace {:?}", ids.len(), namespace);
        let ns = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        let bucket = ns.get(namespace);
        let lookup = |id: &String| bucket.and_then(|b| b.get(id)).map(|r| Self::shaped(r, opts));

        if self.unordered.load(Ordering::SeqCst) {
            let found: BTreeMap<&String, FetchResult> =
                ids.iter().filter_map(|id| lookup(id).map(|r| (id, r))).collect();
            return Ok(found.into_values().map(Some).collect());
        }
        Ok(ids.iter().map(lookup).collect())
    }

    fn info(&self) -> Result<IndexInfo> {
        self.wire.exchange("info")?;
        let ns = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        let namespaces: HashMap<String, NamespaceInfo> = ns
            .iter()
            .map(|(name, bucket)| {
                let info = NamespaceInfo { vector_count: bucket.len(), pending_vector_count: 0 };
                (name.clone(), info)
            })
            .collect();
        let dimension = ns
            .values()
            .flat_map(|b| b.values())
            .find_map(|r| r.vector.as_ref().map(Vec::len))
            .unwrap_or(0);
        Ok(IndexInfo {
            vector_count: namespaces.values().map(|n| n.vector_count).sum(),
            pending_vector_count: 0,
            index_size: 0,
            dimension,
            similarity_function: "COSINE".to_string(),
            namespaces,
        })
    }
}
