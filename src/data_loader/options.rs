// src/data_loader/options.rs
//!
//! Read-time knobs for remote datasets.
//!
//! Builder helpers are provided so callers can write a fluent style:
//!
//! let opts = ReadOptions::default().check_bounds(false);
//! let fetch = FetchOptions::default().include_data(true);
//!

pub use crate::store::vector::FetchOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Query the length before each `get`/`get_many` and reject indices
    /// `>= len` with `IndexOutOfRange` before any record is read.
    /// When off, out-of-range indices surface as `Missing` once the store
    /// reports the record absent.
    pub check_bounds: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { check_bounds: true }
    }
}

impl ReadOptions {
    /// Builder-style helper: set `check_bounds`.
    pub fn check_bounds(mut self, yes: bool) -> Self {
        self.check_bounds = yes;
        self
    }
}
