//! Application configuration management.
//!
//! Configuration is stored at `~/.config/herodex/config.json`. Missing files
//! yield defaults; `HERODEX_API_URL` and `HERODEX_CACHE_DIR` override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "herodex";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Pagination defaults shared by the store and the REST client.
pub struct Pagination;

impl Pagination {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 9;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub default_page: u32,
    pub default_limit: u32,
    pub request_timeout_secs: u64,
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_page: Pagination::DEFAULT_PAGE,
            default_limit: Pagination::DEFAULT_LIMIT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = Self::load_from(&path)?;
        Ok(config.with_env_overrides())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config.sanitized())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

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

    /// Directory holding the persistent cache.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("HERODEX_API_URL").ok(),
            std::env::var("HERODEX_CACHE_DIR").ok(),
        )
    }

    fn with_overrides(mut self, api_url: Option<String>, cache_dir: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = cache_dir.filter(|d| !d.trim().is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        self
    }

    // Page is 1-based and the limit must be positive
    fn sanitized(mut self) -> Self {
        self.default_page = self.default_page.max(1);
        if self.default_limit == 0 {
            self.default_limit = Pagination::DEFAULT_LIMIT;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.default_page, 1);
        assert_eq!(config.default_limit, 9);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("nope.json")).expect("loads");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_partial_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("herodex").join("config.json");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, r#"{"default_limit": 6, "default_page": 0}"#).expect("write");

        let config = Config::load_from(&path).expect("loads");
        assert_eq!(config.default_limit, 6);
        assert_eq!(config.default_page, 1);
        assert_eq!(config.api_base_url, "http://localhost:3000");

        config.save_to(&path).expect("saves");
        assert_eq!(Config::load_from(&path).expect("reloads"), config);
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            Some("http://heroes.internal:8080".to_string()),
            Some("/tmp/herodex-cache".to_string()),
        );
        assert_eq!(config.api_base_url, "http://heroes.internal:8080");
        assert_eq!(
            config.cache_dir().expect("cache dir"),
            PathBuf::from("/tmp/herodex-cache")
        );

        let untouched = Config::default().with_overrides(Some("  ".to_string()), None);
        assert_eq!(untouched, Config::default());
    }
}
