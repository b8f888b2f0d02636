//! In-process cache store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use super::{CacheEntry, CacheStore};

type Generations = HashMap<String, HashMap<String, CacheEntry>>;

/// HashMap-backed store. The single lock is held only for the duration of
/// one map operation, never across an await point.
#[derive(Default)]
pub struct MemoryStore {
    generations: Mutex<Generations>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Generations> {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryStore {
    async fn open(&self, generation: &str) -> Result<()> {
        self.lock().entry(generation.to_string()).or_default();
        Ok(())
    }

    async fn read(&self, generation: &str, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self
            .lock()
            .get(generation)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn write(&self, generation: &str, key: &str, entry: CacheEntry) -> Result<()> {
        self.lock()
            .entry(generation.to_string())
            .or_default()
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, generation: &str) -> Result<bool> {
        Ok(self.lock().remove(generation).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseSnapshot;

    fn entry(body: &str) -> CacheEntry {
        CacheEntry::new(ResponseSnapshot {
            status: 200,
            headers: vec![],
            body: body.as_bytes().to_vec(),
        })
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        store.write("gen-v1", "https://a/x", entry("hello")).await.unwrap();

        let found = store.read("gen-v1", "https://a/x").await.unwrap().unwrap();
        assert_eq!(found.response.body_text(), "hello");
        assert!(store.read("gen-v1", "https://a/y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_overwrites_by_key() {
        let store = MemoryStore::new();
        store.write("gen-v1", "k", entry("old")).await.unwrap();
        store.write("gen-v1", "k", entry("new")).await.unwrap();

        let found = store.read("gen-v1", "k").await.unwrap().unwrap();
        assert_eq!(found.response.body_text(), "new");
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = MemoryStore::new();
        store.open("b-gen").await.unwrap();
        store.open("a-gen").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["a-gen", "b-gen"]);

        assert!(store.delete("a-gen").await.unwrap());
        assert!(!store.delete("a-gen").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["b-gen"]);
    }
}
