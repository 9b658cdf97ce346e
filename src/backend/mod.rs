//! Backend module - Cache stores and the tracing decorator
//!
//! Provides:
//! - memory: in-memory cache bin
//! - debug: decorator that writes a trace comment for every get/set/delete
//! - factory: one traced store per bin, all writing to the same render output
//! - script: replays a render script through the factory

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod debug;
pub mod factory;
pub mod memory;
pub mod script;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Cids must be non-empty
    #[error("invalid cache id: {0:?}")]
    InvalidCid(String),
}

/// When a cache item stops being valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expire {
    #[default]
    Permanent,
    /// Unix timestamp (seconds)
    At(i64),
}

impl Expire {
    pub fn from_timestamp(ts: Option<i64>) -> Self {
        ts.map(Expire::At).unwrap_or(Expire::Permanent)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        match self {
            Expire::Permanent => false,
            Expire::At(ts) => *ts < now,
        }
    }
}

/// A stored cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheItem {
    pub cid: String,
    pub data: serde_json::Value,
    /// Unix timestamp (seconds) of the write
    pub created: i64,
    pub expire: Expire,
    /// Sorted, deduplicated
    pub tags: Vec<String>,
    pub valid: bool,
}

/// Input for `set_multiple`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cid: String,
    pub data: serde_json::Value,
    #[serde(default)]
    pub expire: Expire,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A cache bin
///
/// `get_multiple` removes every cid it found from `cids`, leaving the misses.
pub trait CacheBackend {
    fn get(&self, cid: &str, allow_invalid: bool) -> CacheResult<Option<CacheItem>>;

    fn get_multiple(
        &self,
        cids: &mut Vec<String>,
        allow_invalid: bool,
    ) -> CacheResult<HashMap<String, CacheItem>>;

    fn set(
        &mut self,
        cid: &str,
        data: serde_json::Value,
        expire: Expire,
        tags: &[String],
    ) -> CacheResult<()>;

    fn set_multiple(&mut self, entries: Vec<CacheEntry>) -> CacheResult<()>;

    fn delete(&mut self, cid: &str) -> CacheResult<()>;

    fn delete_multiple(&mut self, cids: &[String]) -> CacheResult<()>;

    fn delete_all(&mut self) -> CacheResult<()>;

    fn invalidate(&mut self, cid: &str) -> CacheResult<()>;

    fn invalidate_multiple(&mut self, cids: &[String]) -> CacheResult<()>;

    fn invalidate_all(&mut self) -> CacheResult<()>;

    fn invalidate_tags(&mut self, tags: &[String]) -> CacheResult<()>;

    fn garbage_collection(&mut self) -> CacheResult<()>;

    fn remove_bin(&mut self) -> CacheResult<()>;
}
