// src/data_loader/locator.rs
//
// Index → locator strategies. Every strategy is a pure function of the index
// plus fixed configuration; none performs I/O or validation.

use std::fmt;

use crate::store::json_path::JsonPath;

/// Maps a sample index to where that sample lives in the store.
pub trait Locate: Send + Sync {
    type Locator: Clone + fmt::Display + Send;

    fn locate(&self, index: usize) -> Self::Locator;
}

/// Caller-supplied index → key (or id) mapping.
pub trait KeyMapping: Send + Sync {
    fn key(&self, index: usize) -> String;
}

impl<F> KeyMapping for F
where
    F: Fn(usize) -> String + Send + Sync,
{
    fn key(&self, index: usize) -> String {
        self(index)
    }
}

/// `i` ↦ `"i"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalIds;

impl KeyMapping for DecimalIds {
    fn key(&self, index: usize) -> String {
        index.to_string()
    }
}

// ── locators ────────────────────────────────────────────────────────────────

/// Position inside a fixed-key list or sorted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(pub usize);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {}", self.0)
    }
}

/// One string value per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisKey(pub String);

impl fmt::Display for RedisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {:?}", self.0)
    }
}

/// A value at `path` inside the JSON document stored at `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLocation {
    pub key: String,
    pub path: JsonPath,
}

impl fmt::Display for JsonLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {:?} path {}", self.key, self.path)
    }
}

/// A record id in a vector index namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorId(pub String);

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id {:?}", self.0)
    }
}

// ── strategies ──────────────────────────────────────────────────────────────

/// The index is the position; no translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionLocator;

impl Locate for PositionLocator {
    type Locator = Position;

    fn locate(&self, index: usize) -> Position {
        Position(index)
    }
}

/// One key per sample.
#[derive(Debug, Clone)]
pub struct KeyLocator<M> {
    mapping: M,
}

impl<M: KeyMapping> KeyLocator<M> {
    pub fn new(mapping: M) -> Self {
        Self { mapping }
    }
}

impl<M: KeyMapping> Locate for KeyLocator<M> {
    type Locator = RedisKey;

    fn locate(&self, index: usize) -> RedisKey {
        RedisKey(self.mapping.key(index))
    }
}

/// Element `index` of the array at `path` in one document.
#[derive(Debug, Clone)]
pub struct ArrayElementLocator {
    key: String,
    path: JsonPath,
}

impl ArrayElementLocator {
    pub fn new(key: impl Into<String>, path: JsonPath) -> Self {
        Self { key: key.into(), path }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }
}

impl Locate for ArrayElementLocator {
    type Locator = JsonLocation;

    fn locate(&self, index: usize) -> JsonLocation {
        JsonLocation { key: self.key.clone(), path: self.path.element(index) }
    }
}

/// The same `path` across one document per sample.
#[derive(Debug, Clone)]
pub struct DocumentLocator<M> {
    mapping: M,
    path: JsonPath,
}

impl<M: KeyMapping> DocumentLocator<M> {
    pub fn new(mapping: M, path: JsonPath) -> Self {
        Self { mapping, path }
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }
}

impl<M: KeyMapping> Locate for DocumentLocator<M> {
    type Locator = JsonLocation;

    fn locate(&self, index: usize) -> JsonLocation {
        JsonLocation { key: self.mapping.key(index), path: self.path.clone() }
    }
}

/// One vector id per sample.
#[derive(Debug, Clone)]
pub struct IdLocator<M> {
    mapping: M,
}

impl<M: KeyMapping> IdLocator<M> {
    pub fn new(mapping: M) -> Self {
        Self { mapping }
    }
}

impl<M: KeyMapping> Locate for IdLocator<M> {
    type Locator = VectorId;

    fn locate(&self, index: usize) -> VectorId {
        VectorId(self.mapping.key(index))
    }
}
