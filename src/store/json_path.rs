// src/store/json_path.rs
//
// The JSONPath subset used to address samples inside JSON documents.
// Supported forms: `$` (or the empty string), followed by any number of
// `.name`, `['name']` and `[n]` segments. Wildcards, slices and filters are
// not supported; every path selects at most one value.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

use crate::constants::ROOT_JSON_PATH;

static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\.([A-Za-z_][A-Za-z0-9_]*)|\['([^']*)'\]|\[(\d+)\])")
        .expect("static JSONPath segment regex")
});

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier regex"));

/// One step below the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// A parsed, canonical JSONPath.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// The path addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path. `""` and `"$"` both mean the root.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() || text == ROOT_JSON_PATH {
            return Ok(Self::root());
        }
        let Some(mut rest) = text.strip_prefix('$') else {
            bail!("JSONPath must start with '$': {:?}", text);
        };

        let mut segments = Vec::new();
        while !rest.is_empty() {
            let Some(caps) = SEGMENT.captures(rest) else {
                bail!("unsupported JSONPath segment {:?} in {:?}", rest, text);
            };
            let segment = if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                Segment::Field(name.as_str().to_string())
            } else {
                let digits = &caps[3];
                let index = digits
                    .parse::<usize>()
                    .map_err(|e| {
                        anyhow::anyhow!("bad array index {:?} in {:?}: {}", digits, text, e)
                    })?;
                Segment::Index(index)
            };
            segments.push(segment);
            rest = &rest[caps[0].len()..];
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The path of the `index`-th element of the array this path addresses.
    pub fn element(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Resolve the path against a document.
    pub fn select<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(doc, |node, seg| match seg {
            Segment::Field(name) => node.as_object()?.get(name),
            Segment::Index(i) => node.as_array()?.get(*i),
        })
    }

    /// Mutable counterpart of [`JsonPath::select`].
    pub fn select_mut<'a>(&self, doc: &'a mut Value) -> Option<&'a mut Value> {
        self.segments.iter().try_fold(doc, |node, seg| match seg {
            Segment::Field(name) => node.as_object_mut()?.get_mut(name),
            Segment::Index(i) => node.as_array_mut()?.get_mut(*i),
        })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ROOT_JSON_PATH)?;
        for seg in &self.segments {
            match seg {
                Segment::Field(name) if IDENT.is_match(name) => write!(f, ".{}", name)?,
                Segment::Field(name) => write!(f, "['{}']", name)?,
                Segment::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}
