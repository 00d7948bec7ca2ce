// src/store/redis.rs
//
// Redis-side client contract: the commands the dataset adapters issue, the
// RESP-shaped replies they expect back, and the two execution primitives
// (single command and pipeline) a client must provide.

use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use std::fmt;

use crate::store::json_path::JsonPath;

/// A read command understood by [`RedisClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LLen { key: String },
    LIndex { key: String, index: i64 },
    ZCard { key: String },
    ZRange { key: String, start: i64, stop: i64, with_scores: bool },
    Get { key: String },
    JsonArrLen { key: String, path: JsonPath },
    JsonGet { key: String, path: JsonPath },
    JsonMGet { keys: Vec<String>, path: JsonPath },
}

impl Command {
    /// Command name as sent on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::LLen { .. } => "LLEN",
            Command::LIndex { .. } => "LINDEX",
            Command::ZCard { .. } => "ZCARD",
            Command::ZRange { .. } => "ZRANGE",
            Command::Get { .. } => "GET",
            Command::JsonArrLen { .. } => "JSON.ARRLEN",
            Command::JsonGet { .. } => "JSON.GET",
            Command::JsonMGet { .. } => "JSON.MGET",
        }
    }

    /// Full argument vector, command name first.
    pub fn args(&self) -> Vec<String> {
        let mut out = vec![self.name().to_string()];
        match self {
            Command::LLen { key } | Command::ZCard { key } | Command::Get { key } => {
                out.push(key.clone());
            }
            Command::LIndex { key, index } => {
                out.push(key.clone());
                out.push(index.to_string());
            }
            Command::ZRange { key, start, stop, with_scores } => {
                out.push(key.clone());
                out.push(start.to_string());
                out.push(stop.to_string());
                if *with_scores {
                    out.push("WITHSCORES".to_string());
                }
            }
            Command::JsonArrLen { key, path } | Command::JsonGet { key, path } => {
                out.push(key.clone());
                out.push(path.to_string());
            }
            Command::JsonMGet { keys, path } => {
                out.extend(keys.iter().cloned());
                out.push(path.to_string());
            }
        }
        out
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}

/// A RESP-shaped reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Int(i64),
    Bulk(String),
    Double(f64),
    Array(Vec<Reply>),
    /// Per-command failure inside a pipeline.
    Error(String),
}

impl Reply {
    /// `Bulk` → `Some`, `Nil` → `None`.
    pub fn into_bulk(self) -> Result<Option<String>> {
        match self {
            Reply::Bulk(s) => Ok(Some(s)),
            Reply::Nil => Ok(None),
            other => Err(unexpected("bulk string", other)),
        }
    }

    /// A non-negative integer count: `Int(n)` or the first element of an
    /// `Array` of counts (JSON.ARRLEN with a `$` path).
    pub fn into_count(self) -> Result<usize> {
        match self {
            Reply::Int(n) if n >= 0 => Ok(n as usize),
            Reply::Array(items) => match items.into_iter().next() {
                Some(first) => first.into_count(),
                None => bail!("empty count reply"),
            },
            other => Err(unexpected("non-negative integer", other)),
        }
    }

    /// First `(member, score)` pair of a ZRANGE ... WITHSCORES reply.
    pub fn into_first_scored(self) -> Result<Option<(String, f64)>> {
        let items = match self {
            Reply::Array(items) => items,
            Reply::Nil => return Ok(None),
            other => return Err(unexpected("array", other)),
        };
        let mut it = items.into_iter();
        let (Some(member), Some(score)) = (it.next(), it.next()) else {
            return Ok(None);
        };
        let member = member
            .into_bulk()?
            .ok_or_else(|| anyhow!("sorted set member is nil"))?;
        let score = match score {
            Reply::Double(d) => d,
            Reply::Int(i) => i as f64,
            Reply::Bulk(s) => parse_score(&s)?,
            other => return Err(unexpected("score", other)),
        };
        Ok(Some((member, score)))
    }

    /// First match of a JSON.GET reply issued with a `$` path. `Nil` (missing
    /// key) and an empty match list both yield `None`.
    pub fn into_first_json_match(self) -> Result<Option<Value>> {
        let Some(text) = self.into_bulk()? else {
            return Ok(None);
        };
        match serde_json::from_str::<Value>(&text)? {
            Value::Array(matches) => Ok(matches.into_iter().next()),
            other => {
                bail!("JSON.GET with a JSONPath should return an array of matches, got {}", other)
            }
        }
    }

    /// Turn an in-pipeline `Error` into a real error.
    pub fn check(self) -> Result<Self> {
        match self {
            Reply::Error(msg) => Err(anyhow!(msg)),
            other => Ok(other),
        }
    }
}

fn parse_score(s: &str) -> Result<f64> {
    match s {
        "inf" | "+inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        _ => s
            .parse::<f64>()
            .map_err(|e| anyhow!("bad sorted set score {:?}: {}", s, e)),
    }
}

fn unexpected(expected: &str, got: Reply) -> anyhow::Error {
    match got {
        Reply::Error(msg) => anyhow!(msg),
        other => anyhow!("protocol error: expected {}, got {:?}", expected, other),
    }
}

/// Blocking Redis client as seen by the dataset adapters.
///
/// Timeouts, retries and connection management belong to the implementor.
pub trait RedisClient: Send + Sync {
    /// Execute one command in one round trip.
    fn execute(&self, cmd: Command) -> Result<Reply>;

    /// Execute all commands in one round trip. Replies are positionally
    /// aligned with `cmds`; a failing command yields `Reply::Error` in its
    /// slot instead of failing the whole exchange.
    fn pipeline(&self, cmds: Vec<Command>) -> Result<Vec<Reply>>;
}

impl<C: RedisClient + ?Sized> RedisClient for std::sync::Arc<C> {
    fn execute(&self, cmd: Command) -> Result<Reply> {
        (**self).execute(cmd)
    }

    fn pipeline(&self, cmds: Vec<Command>) -> Result<Vec<Reply>> {
        (**self).pipeline(cmds)
    }
}
