// src/constants.rs
//
// Centralized constants for upstash-dataset to avoid hardcoded values throughout the codebase

/// JSONPath that addresses the whole document.
pub const ROOT_JSON_PATH: &str = "$";

/// Namespace used by the vector index when the caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "";

/// Redis error prefix for commands issued against a key of the wrong type.
pub const WRONGTYPE_ERROR: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";

