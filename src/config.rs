//! Cache manager configuration.
//!
//! This module holds the deployment-time knobs of the cache manager: the
//! version string that stamps every generation name, the install manifest,
//! and the routing markers used to classify requests.
//!
//! Configuration is stored at `~/.config/muslim-guide/offline-cache.json`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "muslim-guide";

/// Config file name
const CONFIG_FILE: &str = "offline-cache.json";

/// Default deployed version. Replaced on every deployment.
const DEFAULT_VERSION: &str = "v2.0.0";

/// Default origin the app shell is served from (Vite preview server).
const DEFAULT_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Version string seeding all three generation names.
    pub version: String,
    /// Base URL that manifest paths are resolved against.
    pub origin: String,
    /// Prefix shared by every generation name in the store.
    pub cache_prefix: String,
    /// Resources that must be cached before a new version may activate.
    pub manifest: Vec<String>,
    /// Hostname substrings that mark a request as an API call.
    pub api_hosts: Vec<String>,
    /// Path substrings that mark a request as an API call.
    pub api_paths: Vec<String>,
    /// File extensions handled by the cache-first static-asset strategy.
    pub static_extensions: Vec<String>,
}

impl ManagerConfig {
    /// Configuration for the given deployed version, with the routing
    /// markers and manifest of the Muslim Guide deployment.
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            cache_prefix: APP_NAME.to_string(),
            manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/icon.svg".to_string(),
            ],
            api_hosts: vec!["supabase".to_string()],
            api_paths: vec!["/functions/".to_string()],
            static_extensions: [
                "js", "css", "png", "jpg", "jpeg", "svg", "gif", "webp", "woff", "woff2",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Load from an explicit file path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to an explicit file path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Resolve a manifest path against the configured origin.
    pub fn manifest_url(&self, path: &str) -> Result<Url> {
        let origin = Url::parse(&self.origin)?;
        Ok(origin.join(path)?)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest_covers_app_shell() {
        let config = ManagerConfig::default();
        assert_eq!(
            config.manifest,
            vec!["/", "/index.html", "/manifest.json", "/icon.svg"]
        );
        assert_eq!(config.cache_prefix, "muslim-guide");
    }

    #[test]
    fn test_manifest_url_resolution() {
        let config = ManagerConfig::new("v1");
        let url = config.manifest_url("/icon.svg").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5173/icon.svg");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("offline-cache.json");

        let mut config = ManagerConfig::new("v7");
        config.api_hosts.push("adhan-api".to_string());
        config.save_to(&path).unwrap();

        let loaded = ManagerConfig::load_from(&path).unwrap();
        assert_eq!(loaded.version, "v7");
        assert!(loaded.api_hosts.contains(&"adhan-api".to_string()));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ManagerConfig::load_from(&dir.path().join("missing.json")).unwrap();
        assert_eq!(loaded.version, "v2.0.0");
        assert_eq!(loaded.cache_prefix, "muslim-guide");
    }

    #[test]
    fn test_serde_round_trip() {
        let config = ManagerConfig::new("v9");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ManagerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, "v9");
        assert_eq!(parsed.static_extensions, config.static_extensions);
    }
}
