//! On-disk cache store.
//!
//! Layout: one directory per generation under the store root, one JSON file
//! per cached entry. Entry file names are the hex SHA-256 of the cache key:
//! URL keys contain characters that are not filesystem-safe and can run past
//! filesystem name limits, so the key never appears in the file name.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use super::{CacheEntry, CacheStore};

/// Application name used for the default cache directory path
const APP_NAME: &str = "muslim-guide";

/// Subdirectory holding the offline response cache
const STORE_DIR: &str = "offline";

pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create cache store root: {}", root.display()))?;
        Ok(Self { root })
    }

    /// Store rooted at the platform cache directory.
    pub fn open_default() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Self::new(cache_dir.join(APP_NAME).join(STORE_DIR))
    }

    fn generation_dir(&self, generation: &str) -> PathBuf {
        self.root.join(generation)
    }

    fn entry_path(&self, generation: &str, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.generation_dir(generation)
            .join(format!("{digest:x}.json"))
    }
}

impl CacheStore for DiskStore {
    async fn open(&self, generation: &str) -> Result<()> {
        std::fs::create_dir_all(self.generation_dir(generation))?;
        Ok(())
    }

    async fn read(&self, generation: &str, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(generation, key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache entry: {}", path.display()))?;
        let entry: CacheEntry = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache entry: {}", path.display()))?;
        Ok(Some(entry))
    }

    async fn write(&self, generation: &str, key: &str, entry: CacheEntry) -> Result<()> {
        std::fs::create_dir_all(self.generation_dir(generation))?;
        let contents = serde_json::to_string_pretty(&entry)?;
        std::fs::write(self.entry_path(generation, key), contents)?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for dir_entry in std::fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_type()?.is_dir() {
                names.push(dir_entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, generation: &str) -> Result<bool> {
        let dir = self.generation_dir(generation);
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to delete generation: {generation}"))?;
        Ok(true)
    }
}
