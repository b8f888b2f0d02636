//! Persistent cache store for versioned generations.
//!
//! This module provides the `CacheStore` trait - the five operations the
//! cache manager needs from its backing store - plus two implementations:
//!
//! - `MemoryStore`: in-process map, used by tests and embedded hosts
//! - `DiskStore`: one directory per generation, one JSON file per entry
//!
//! Entries are keyed by normalized GET URL. Writes overwrite by key; a
//! generation never holds duplicate entries for the same key.

pub mod disk;
pub mod memory;

use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ResponseSnapshot;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// A cached response snapshot together with when it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at: DateTime<Utc>,
    pub response: ResponseSnapshot,
}

impl CacheEntry {
    pub fn new(response: ResponseSnapshot) -> Self {
        Self {
            stored_at: Utc::now(),
            response,
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.stored_at).num_minutes()
    }
}

/// The five store operations the cache manager relies on.
///
/// Individual operations are atomic from the caller's perspective; nothing
/// here requires multi-key atomicity. Futures are `Send` so background
/// writes can be detached onto the runtime. Errors are environment-level
/// failures - the manager surfaces them rather than recovering.
pub trait CacheStore: Send + Sync {
    /// Open a generation, creating it if absent.
    fn open(&self, generation: &str) -> impl Future<Output = Result<()>> + Send;

    /// Read the entry stored under `key`, if any.
    fn read(
        &self,
        generation: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<CacheEntry>>> + Send;

    /// Store an entry under `key`, overwriting any previous entry.
    fn write(
        &self,
        generation: &str,
        key: &str,
        entry: CacheEntry,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Names of all generations currently in the store.
    fn list(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Delete an entire generation. Returns whether it existed.
    fn delete(&self, generation: &str) -> impl Future<Output = Result<bool>> + Send;
}
